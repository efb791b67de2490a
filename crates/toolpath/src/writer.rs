//! The downstream G-code writer capability.

use geom::{Point2, Point3};

/// The low-level code writer the planner emits into. Implementations format
/// text lines and track printer position and extruder state; the planner
/// only ever drives one through this interface, and only during the flush.
pub trait GCodeWriter {
    /// The z height queued points are stamped with.
    fn current_z(&self) -> i64;

    fn current_extruder(&self) -> usize;

    /// The last written head position.
    fn position(&self) -> Point3;

    fn position_xy(&self) -> Point2 {
        self.position().xy()
    }

    fn switch_extruder(&mut self, extruder_index: usize);

    fn retract(&mut self);

    fn set_fan_speed(&mut self, percent: i64);

    fn write_comment(&mut self, comment: &str);

    /// Writes one motion. A `line_width_um` of zero is a travel move,
    /// anything else extrudes at that width.
    fn write_move(&mut self, to: Point3, speed_mm_s: i64, line_width_um: i64);

    /// Called once after a layer's paths have all been written.
    fn update_total_print_time(&mut self);
}
