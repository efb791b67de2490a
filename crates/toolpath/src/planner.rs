//! The layer planner: buffered move queuing.
//!
//! One `LayerPlanner` is constructed per layer around a mutable writer
//! handle. The front-end queues travels, extrusions, and polygons; the
//! planner groups them into paths by config and extruder and decides
//! retractions. Nothing reaches the writer until
//! [`write_queued`](LayerPlanner::write_queued) consumes the planner.

use crate::avoidance::PerimeterAvoidance;
use crate::config::PathConfig;
use crate::order::IslandOrderOptimizer;
use crate::path::{GCodePath, PathConfigRef};
use crate::settings::PlannerSettings;
use crate::writer::GCodeWriter;
use geom::{Point2, Polygon};
use tracing::trace;

pub struct LayerPlanner<'g, 'c, W: GCodeWriter> {
    pub(crate) gcode: &'g mut W,
    pub(crate) paths: Vec<GCodePath<'c>>,
    pub(crate) last_position: Point2,
    pub(crate) travel_config: PathConfig,
    pub(crate) current_extruder_index: usize,
    pub(crate) outer_perimeters_to_avoid: Option<&'c dyn PerimeterAvoidance>,
    pub(crate) force_retraction: bool,
    pub(crate) always_retract: bool,
    /// Integer percent, never below 1.
    pub(crate) extrude_speed_factor: i64,
    pub(crate) travel_speed_factor: i64,
    /// Travels shorter than this never trigger a retraction.
    pub(crate) retraction_minimum_distance_um: i64,
    pub(crate) merge_overlapping_lines: bool,
    pub(crate) total_print_time: f64,
    pub(crate) extra_time: f64,
}

impl<'g, 'c, W: GCodeWriter> LayerPlanner<'g, 'c, W> {
    pub fn new(gcode: &'g mut W, travel_speed_mm_s: i64, retraction_minimum_distance_um: i64) -> Self {
        let last_position = gcode.position_xy();
        let current_extruder_index = gcode.current_extruder();
        Self {
            gcode,
            paths: Vec::new(),
            last_position,
            travel_config: PathConfig::travel(travel_speed_mm_s),
            current_extruder_index,
            outer_perimeters_to_avoid: None,
            force_retraction: false,
            always_retract: false,
            extrude_speed_factor: 100,
            travel_speed_factor: 100,
            retraction_minimum_distance_um,
            merge_overlapping_lines: false,
            total_print_time: 0.0,
            extra_time: 0.0,
        }
    }

    /// Convenience constructor wiring the planner-relevant settings knobs.
    pub fn from_settings(gcode: &'g mut W, settings: &PlannerSettings) -> Self {
        let mut planner = Self::new(
            gcode,
            settings.travel_speed_mm_s,
            settings.retraction_minimum_distance_um,
        );
        planner.set_always_retract(settings.always_retract);
        planner.set_merge_overlapping_lines(settings.merge_overlapping_lines);
        planner
    }

    /// Switches the extruder used by subsequently queued paths. Returns
    /// whether the index actually changed.
    pub fn set_extruder(&mut self, extruder_index: usize) -> bool {
        if extruder_index == self.current_extruder_index {
            return false;
        }
        self.current_extruder_index = extruder_index;
        true
    }

    pub fn current_extruder(&self) -> usize {
        self.current_extruder_index
    }

    /// The next queued travel retracts regardless of distance.
    pub fn force_retract(&mut self) {
        self.force_retraction = true;
    }

    pub fn set_always_retract(&mut self, always_retract: bool) {
        self.always_retract = always_retract;
    }

    pub fn set_extrude_speed_factor(&mut self, percent: i64) {
        self.extrude_speed_factor = percent.max(1);
    }

    pub fn extrude_speed_factor(&self) -> i64 {
        self.extrude_speed_factor
    }

    pub fn set_travel_speed_factor(&mut self, percent: i64) {
        self.travel_speed_factor = percent.max(1);
    }

    pub fn travel_speed_factor(&self) -> i64 {
        self.travel_speed_factor
    }

    /// Installs (or removes) the boundary oracle that keeps travels inside
    /// the outer perimeter.
    pub fn set_outer_perimeters_to_avoid(
        &mut self,
        boundary: Option<&'c dyn PerimeterAvoidance>,
    ) {
        self.outer_perimeters_to_avoid = boundary;
    }

    /// Enables rewriting closed perimeters that overlap themselves as
    /// single wider extrusions at emission time. Off by default.
    pub fn set_merge_overlapping_lines(&mut self, merge: bool) {
        self.merge_overlapping_lines = merge;
    }

    /// The logical head XY after the last queued move.
    pub fn last_position(&self) -> Point2 {
        self.last_position
    }

    pub fn total_print_time(&self) -> f64 {
        self.total_print_time
    }

    pub fn extra_time(&self) -> f64 {
        self.extra_time
    }

    /// The paths buffered so far, in queue order.
    pub fn queued_paths(&self) -> &[GCodePath<'c>] {
        &self.paths
    }

    /// Marks the tail path as finished so the next queued move starts a
    /// fresh path, with its own independent retraction decision.
    pub fn force_new_path_start(&mut self) {
        if let Some(path) = self.paths.last_mut() {
            path.done = true;
        }
    }

    fn get_latest_path_with_config(&mut self, config: PathConfigRef<'c>) -> &mut GCodePath<'c> {
        let reusable = self
            .paths
            .last()
            .is_some_and(|path| path.config == config && !path.done);
        if !reusable {
            self.paths
                .push(GCodePath::new(config, self.current_extruder_index));
        }
        self.paths.last_mut().unwrap()
    }

    /// Queues a move to `destination` without extruding, retracting first
    /// when the move is long or leaves the boundary. With a boundary
    /// oracle installed the travel is routed through interior via points
    /// where possible.
    pub fn queue_travel(&mut self, destination: Point2) {
        let mut retract = false;
        let mut via_points: Vec<Point2> = Vec::new();

        if self.force_retraction {
            retract = true;
            self.force_retraction = false;
        } else if let Some(boundary) = self.outer_perimeters_to_avoid {
            if let Some(route) = boundary.route_inside(self.last_position, destination) {
                // We can stay inside, so move within the boundary. A long
                // interior move still oozes, so retract over the threshold
                // anyway. The route holds only the via points; the total
                // in-boundary distance runs from the current position
                // through them to the destination.
                let mut route_length = 0;
                let mut previous = self.last_position;
                for &via in &route {
                    route_length += (via - previous).length();
                    previous = via;
                }
                route_length += (destination - previous).length();
                if route_length > self.retraction_minimum_distance_um {
                    retract = true;
                }
                via_points = route;
            } else if (destination - self.last_position).longer_than(self.retraction_minimum_distance_um) {
                // Moving through open air.
                retract = true;
            }
        } else if self.always_retract
            && (destination - self.last_position).longer_than(self.retraction_minimum_distance_um)
        {
            retract = true;
        }

        trace!(?destination, retract, "queueing travel");
        let z = self.gcode.current_z();
        let path = self.get_latest_path_with_config(PathConfigRef::Travel);
        if retract {
            path.retract_before = true;
        }
        for via in via_points {
            path.points.push(via.at_z(z));
        }
        path.points.push(destination.at_z(z));
        self.last_position = destination;
    }

    /// Queues an extruding move to `destination` under `config`.
    pub fn queue_extrusion(&mut self, destination: Point2, config: &'c PathConfig) {
        let z = self.gcode.current_z();
        let path = self.get_latest_path_with_config(PathConfigRef::Print(config));
        path.points.push(destination.at_z(z));
        self.last_position = destination;
    }

    /// Queues a whole polygon starting at `start_index`: a travel to the
    /// start vertex when needed, then extrusions around the loop (closing
    /// it for closed-loop configs), or along the polyline for open ones.
    pub fn queue_polygon(&mut self, polygon: &[Point2], start_index: usize, config: &'c PathConfig) {
        debug_assert!(!polygon.is_empty(), "cannot queue an empty polygon");
        debug_assert!(start_index < polygon.len(), "start index out of range");

        let start = polygon[start_index];
        if !config.spiralize && self.last_position != start {
            self.queue_travel(start);
        }

        let count = polygon.len();
        if config.closed_loop {
            for offset in 1..count {
                self.queue_extrusion(polygon[(start_index + offset) % count], config);
            }
            if count > 2 {
                self.queue_extrusion(start, config);
            }
        } else if start_index == 0 {
            for &point in &polygon[1..] {
                self.queue_extrusion(point, config);
            }
        } else {
            // Entering an open polyline at its far end walks it backwards.
            for offset in (1..count).rev() {
                self.queue_extrusion(polygon[(start_index + offset) % count], config);
            }
        }
    }

    /// Queues several polygons in the order picked by `optimizer`.
    pub fn queue_polygons_by_optimizer(
        &mut self,
        polygons: &[Polygon],
        config: &'c PathConfig,
        optimizer: &dyn IslandOrderOptimizer,
    ) {
        for entry in optimizer.visit_order(polygons, self.last_position) {
            self.queue_polygon(&polygons[entry.polygon_index], entry.vertex_index, config);
        }
    }

    /// When the head sits outside the boundary (e.g. after printing skirt
    /// or brim), travels back inside before the next path so the following
    /// retraction happens inside the part.
    pub fn move_inside_the_outer_perimeter(&mut self, distance_um: i64) {
        let Some(boundary) = self.outer_perimeters_to_avoid else {
            return;
        };
        if boundary.point_is_inside(self.last_position) {
            return;
        }
        let mut point = self.last_position;
        // Project twice: a tight corner can land the first projection on
        // the wrong side. Both calls are best effort; only the final
        // inside check matters.
        boundary.move_point_inside(&mut point, distance_um);
        boundary.move_point_inside(&mut point, distance_um);
        if boundary.point_is_inside(point) {
            self.queue_travel(point);
            // Make sure any retraction happens after this move, not before
            // it, by starting a new path.
            self.force_new_path_start();
        }
    }

    /// Scales extrusion speeds down so this layer takes at least
    /// `minimum_time_s`, without pushing any path below
    /// `minimum_printing_speed_mm_s`. The resulting factor only ever
    /// decreases within a layer; a stricter factor set earlier (e.g. a
    /// first-layer slowdown) is kept.
    pub fn force_minimum_layer_time(&mut self, minimum_time_s: f64, minimum_printing_speed_mm_s: i64) {
        let mut position = self.gcode.position();
        let mut travel_time = 0.0;
        let mut extrude_time = 0.0;
        for path in &self.paths {
            let (speed, line_width) = match path.config {
                PathConfigRef::Travel => (self.travel_config.speed_mm_s, 0),
                PathConfigRef::Print(config) => (config.speed_mm_s, config.line_width_um),
            };
            for &point in &path.points {
                let segment_time = (point - position).length_mm() / speed as f64;
                if line_width == 0 {
                    travel_time += segment_time;
                } else {
                    extrude_time += segment_time;
                }
                position = point;
            }
        }

        let total_time = extrude_time + travel_time;
        self.total_print_time = total_time;
        if total_time >= minimum_time_s || extrude_time <= 0.0 {
            return;
        }

        let minimum_extrude_time = (minimum_time_s - travel_time).max(1.0);
        let mut factor = extrude_time / minimum_extrude_time;
        // Loosen the slowdown where it would push a path below the
        // printing-speed floor. The clamp is computed over all extrusion
        // paths first and applied uniformly.
        for path in &self.paths {
            let Some(config) = path.config.print_config() else {
                continue;
            };
            if config.line_width_um == 0 {
                continue;
            }
            let floor_factor = minimum_printing_speed_mm_s as f64 / config.speed_mm_s as f64;
            if factor < floor_factor {
                factor = floor_factor;
            }
        }

        let candidate = (factor * 100.0).round() as i64;
        // Only slow down further than a factor already in effect; never
        // speed a layer back up.
        if candidate < self.extrude_speed_factor {
            self.set_extrude_speed_factor(candidate);
        }

        let effective_factor = self.extrude_speed_factor as f64 / 100.0;
        self.total_print_time = extrude_time / effective_factor + travel_time;
        self.extra_time = minimum_time_s - self.total_print_time;
        trace!(
            factor = self.extrude_speed_factor,
            total_print_time = self.total_print_time,
            extra_time = self.extra_time,
            "applied minimum layer time"
        );
    }
}
