//! The emission pass: a single walk over the queued paths that applies
//! speed factors, spiral z interpolation, small-move coalescing, and
//! outer-wall trimming while driving the writer.

use crate::config::PathConfig;
use crate::overlap::remove_perimeter_overlaps;
use crate::path::PathConfigRef;
use crate::planner::LayerPlanner;
use crate::writer::GCodeWriter;
use geom::Point3;
use tracing::debug;

impl<'g, 'c, W: GCodeWriter> LayerPlanner<'g, 'c, W> {
    /// Flushes every queued path to the writer, in queue order, consuming
    /// the planner.
    ///
    /// Negative fan percentages mean "no fan override": bridge paths then
    /// print without fan changes.
    pub fn write_queued(
        mut self,
        layer_thickness_um: i64,
        fan_speed_percent: i64,
        bridge_fan_speed_percent: i64,
    ) {
        debug!(paths = self.paths.len(), "writing queued toolpaths");
        let mut last_config: Option<&'c PathConfig> = None;
        let mut extruder_index = self.gcode.current_extruder();
        let mut path_index = 0;

        while path_index < self.paths.len() {
            let config = self.paths[path_index].config;

            // An extruder switch covers whatever retraction the writer
            // performs for it; otherwise retract before the first motion.
            if self.paths[path_index].extruder_index != extruder_index {
                extruder_index = self.paths[path_index].extruder_index;
                self.gcode.switch_extruder(extruder_index);
            } else if self.paths[path_index].retract_before {
                self.gcode.retract();
            }

            if let Some(print_config) = config.print_config() {
                if last_config.map_or(true, |previous| !std::ptr::eq(previous, print_config)) {
                    if print_config.is_bridge() && bridge_fan_speed_percent >= 0 {
                        self.gcode.set_fan_speed(bridge_fan_speed_percent);
                    } else if last_config.is_some_and(PathConfig::is_bridge)
                        && bridge_fan_speed_percent >= 0
                    {
                        self.gcode.set_fan_speed(fan_speed_percent);
                    }
                    self.gcode
                        .write_comment(&format!("TYPE:{}", print_config.comment));
                    last_config = Some(print_config);
                }
            }

            let speed = match config {
                PathConfigRef::Travel => {
                    self.travel_config.speed_mm_s * self.travel_speed_factor / 100
                }
                PathConfigRef::Print(print_config) => {
                    if print_config.is_bridge() {
                        // Cooling slowdowns must not starve bridges.
                        print_config.speed_mm_s
                    } else {
                        print_config.speed_mm_s * self.extrude_speed_factor / 100
                    }
                }
            };

            if let Some(print_config) = config.print_config() {
                if let Some(resume_index) =
                    self.try_coalesce_small_moves(path_index, print_config, speed)
                {
                    path_index = resume_index;
                    continue;
                }
                if self.try_spiralize(path_index, print_config, speed, layer_thickness_um) {
                    path_index += 1;
                    continue;
                }
                if self.merge_overlapping_lines
                    && self.try_merge_overlaps(path_index, print_config, speed)
                {
                    path_index += 1;
                    continue;
                }
                if print_config.is_wall() {
                    trim_path_end(
                        &mut self.paths[path_index].points,
                        print_config.line_width_um * 9 / 10,
                    );
                }
            }

            let line_width = config.print_config().map_or(0, |c| c.line_width_um);
            for index in 0..self.paths[path_index].points.len() {
                let point = self.paths[path_index].points[index];
                self.gcode.write_move(point, speed, line_width);
            }
            path_index += 1;
        }

        self.gcode.update_total_print_time();
    }

    /// Combines a run of short single-point extrusions into fewer, longer
    /// moves. Returns the index to resume at when the run was coalesced.
    fn try_coalesce_small_moves(
        &mut self,
        path_index: usize,
        config: &PathConfig,
        speed: i64,
    ) -> Option<usize> {
        let threshold = config.line_width_um * 2;
        if self.paths[path_index].points.len() != 1 {
            return None;
        }
        if !(self.gcode.position_xy() - self.paths[path_index].points[0].xy())
            .shorter_than(threshold)
        {
            return None;
        }

        let mut next_position = self.paths[path_index].points[0].xy();
        let mut scan = path_index + 1;
        while scan < self.paths.len()
            && self.paths[scan].points.len() == 1
            && (self.paths[scan].points[0].xy() - next_position).shorter_than(threshold)
        {
            next_position = self.paths[scan].points[0].xy();
            scan += 1;
        }
        // A travel at the end of the run is written normally instead.
        if self.paths[scan - 1].config.is_travel() {
            scan -= 1;
        }
        // Only worthwhile past two paths.
        if scan <= path_index + 2 {
            return None;
        }

        let mut next_position = self.gcode.position_xy();
        let mut pair_index = path_index;
        while pair_index < scan - 1 {
            let first_point = self.paths[pair_index].points[0];
            let second_point = self.paths[pair_index + 1].points[0];
            // The merged move stands in for both original segments of the
            // pair; stretch the width over the shorter replacement so the
            // extruded volume stays the same.
            let old_length = (first_point.xy() - next_position).length()
                + (second_point.xy() - first_point.xy()).length();
            let merged_point = (first_point + second_point) / 2;
            let new_length = (self.gcode.position_xy() - merged_point.xy()).length();
            if new_length > 0 {
                let width = config.line_width_um * old_length / new_length;
                self.gcode.write_move(merged_point, speed, width);
            }
            next_position = second_point.xy();
            pair_index += 2;
        }
        let final_point = self.paths[scan - 1].points[0];
        self.gcode.write_move(final_point, speed, config.line_width_um);
        Some(scan)
    }

    /// Writes a spiralize path with z rising linearly along the loop's
    /// circumference. Only the last spiralize path in the buffer gets the
    /// lift.
    fn try_spiralize(
        &mut self,
        path_index: usize,
        config: &PathConfig,
        speed: i64,
        layer_thickness_um: i64,
    ) -> bool {
        if !config.spiralize {
            return false;
        }
        let later_spiralize = self.paths[path_index + 1..].iter().any(|path| {
            path.config
                .print_config()
                .is_some_and(|later| later.spiralize)
        });
        if later_spiralize {
            return false;
        }

        let mut total_length = 0;
        let mut previous = self.gcode.position_xy();
        for point in &self.paths[path_index].points {
            total_length += (point.xy() - previous).length();
            previous = point.xy();
        }

        let base_z = self.gcode.current_z();
        let mut cumulative = 0;
        let mut previous = self.gcode.position_xy();
        for index in 0..self.paths[path_index].points.len() {
            let point = self.paths[path_index].points[index];
            cumulative += (point.xy() - previous).length();
            previous = point.xy();
            let z = if total_length > 0 {
                base_z + (layer_thickness_um * cumulative + total_length / 2) / total_length
            } else {
                base_z
            };
            self.gcode
                .write_move(Point3::new(point.x, point.y, z), speed, config.line_width_um);
        }
        true
    }

    /// Rewrites a completed closed loop whose perimeter overlaps itself,
    /// emitting the merged fragments instead of the original points.
    fn try_merge_overlaps(&mut self, path_index: usize, config: &PathConfig, speed: i64) -> bool {
        let points = &self.paths[path_index].points;
        if config.line_width_um == 0 || points.len() <= 2 {
            return false;
        }
        // Only loops the head has already traversed back to: the previous
        // path ended exactly on this path's final point.
        let Some(&last_point) = points.last() else {
            return false;
        };
        if self.gcode.position() != last_point {
            return false;
        }

        let (modified, fragments) = remove_perimeter_overlaps(points, config.line_width_um);
        if !modified {
            return false;
        }
        for fragment in &fragments {
            if fragment.path.is_empty() {
                continue;
            }
            if self.gcode.position_xy() != fragment.path[0].xy() {
                // Hop to the fragment start without extruding.
                self.gcode.write_move(fragment.path[0], speed, 0);
            }
            for &point in &fragment.path[1..] {
                self.gcode
                    .write_move(point, speed, fragment.extrusion_width_um);
            }
        }
        true
    }
}

/// Removes `target_um` of arc length from the tail of a wall loop so the
/// seam overlaps its start instead of leaving a gap. The walk stops at the
/// first segment longer than the remaining target, so the path always
/// keeps at least its first point.
fn trim_path_end(points: &mut Vec<Point3>, mut target_um: i64) {
    while points.len() >= 2 {
        let last = points.len() - 1;
        let segment_length = (points[last].xy() - points[last - 1].xy()).length();
        if segment_length > target_um {
            let remaining = segment_length - target_um;
            // Within truncation error of the target; leave the point as is.
            if remaining > 100 {
                let delta = points[last] - points[last - 1];
                points[last] = points[last - 1] + delta * remaining / segment_length;
            }
            return;
        } else if segment_length == target_um {
            points.pop();
            return;
        }
        points.pop();
        target_um -= segment_length;
    }
}
