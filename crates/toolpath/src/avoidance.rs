//! The perimeter-avoidance capability.

use geom::Point2;

/// An oracle over the outer-perimeter boundary of a part, used to keep
/// travel moves inside the part so the nozzle does not drag ooze across
/// outside surfaces.
pub trait PerimeterAvoidance {
    /// Whether `point` lies inside the boundary.
    fn point_is_inside(&self, point: Point2) -> bool;

    /// Projects `point` towards the inside of the boundary by `distance_um`.
    /// Best effort: the point may be moved even when `false` is returned,
    /// so callers should re-check with [`point_is_inside`].
    ///
    /// [`point_is_inside`]: PerimeterAvoidance::point_is_inside
    fn move_point_inside(&self, point: &mut Point2, distance_um: i64) -> bool;

    /// Computes a piecewise-linear route from `from` to `to` that stays
    /// inside the boundary. Returns the intermediate via points, or `None`
    /// when no interior route exists and the travel has to cross the
    /// boundary.
    fn route_inside(&self, from: Point2, to: Point2) -> Option<Vec<Point2>>;
}
