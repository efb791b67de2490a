//! Recording Fake Writer
//!
//! Implements the planner's writer interface by recording every call as an
//! event and tracking head position and extruder state, so tests can
//! assert on the exact emitted motion stream.

use geom::Point3;
use serde::{Deserialize, Serialize};
use toolpath::GCodeWriter;
use tracing::debug;

/// One recorded writer call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum WriteEvent {
    SwitchExtruder { extruder_index: usize },
    Retract,
    FanSpeed { percent: i64 },
    Comment { text: String },
    Move {
        to: Point3,
        speed_mm_s: i64,
        line_width_um: i64,
    },
    TotalPrintTimeUpdated,
}

/// A fake G-code writer that records events instead of formatting text.
#[derive(Debug, Default)]
pub struct FakeWriter {
    position: Point3,
    current_z: i64,
    extruder_index: usize,
    pub events: Vec<WriteEvent>,
}

impl FakeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer whose head starts at the given position.
    pub fn at(position: Point3) -> Self {
        Self {
            position,
            current_z: position.z,
            ..Self::default()
        }
    }

    /// Sets the z height queued points are stamped with, as layer setup
    /// would.
    pub fn set_z(&mut self, z: i64) {
        self.current_z = z;
    }

    /// All recorded motions.
    pub fn moves(&self) -> Vec<&WriteEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event, WriteEvent::Move { .. }))
            .collect()
    }

    /// Recorded motions that extrude (width > 0).
    pub fn extrusions(&self) -> Vec<&WriteEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event, WriteEvent::Move { line_width_um, .. } if *line_width_um > 0))
            .collect()
    }

    /// The destinations of all recorded motions.
    pub fn move_targets(&self) -> Vec<Point3> {
        self.events
            .iter()
            .filter_map(|event| match event {
                WriteEvent::Move { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl GCodeWriter for FakeWriter {
    fn current_z(&self) -> i64 {
        self.current_z
    }

    fn current_extruder(&self) -> usize {
        self.extruder_index
    }

    fn position(&self) -> Point3 {
        self.position
    }

    fn switch_extruder(&mut self, extruder_index: usize) {
        self.extruder_index = extruder_index;
        self.events
            .push(WriteEvent::SwitchExtruder { extruder_index });
    }

    fn retract(&mut self) {
        self.events.push(WriteEvent::Retract);
    }

    fn set_fan_speed(&mut self, percent: i64) {
        self.events.push(WriteEvent::FanSpeed { percent });
    }

    fn write_comment(&mut self, comment: &str) {
        self.events.push(WriteEvent::Comment {
            text: comment.to_string(),
        });
    }

    fn write_move(&mut self, to: Point3, speed_mm_s: i64, line_width_um: i64) {
        debug!(?to, speed_mm_s, line_width_um, "recorded move");
        self.position = to;
        self.events.push(WriteEvent::Move {
            to,
            speed_mm_s,
            line_width_um,
        });
    }

    fn update_total_print_time(&mut self) {
        self.events.push(WriteEvent::TotalPrintTimeUpdated);
    }
}
