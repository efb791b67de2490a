//! Extrusion path configurations.

/// Comment tag for the visible outermost perimeter of a shell.
pub const WALL_OUTER: &str = "WALL-OUTER";
/// Comment tag for the structural inner perimeters of a shell.
pub const WALL_INNER: &str = "WALL-INNER";
/// Comment tag for extrusions spanning open air.
pub const BRIDGE: &str = "BRIDGE";

/// One motion kind (outer wall, infill, bridge, ...) with its nominal speed
/// and extrusion width.
///
/// Paths are grouped by config *instance*: the planner compares configs by
/// pointer identity, so the front-end should create one config per motion
/// kind and pass references to it. The comment is an opaque tag written as
/// a `TYPE:` line; [`WALL_OUTER`], [`WALL_INNER`] and [`BRIDGE`] are
/// recognized by the emission pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub speed_mm_s: i64,
    pub line_width_um: i64,
    pub comment: String,
    /// Print this path as one continuous helix with z rising along the loop.
    pub spiralize: bool,
    /// The path is a closed loop rather than an open polyline.
    pub closed_loop: bool,
}

impl PathConfig {
    pub fn new(comment: &str, speed_mm_s: i64, line_width_um: i64) -> Self {
        Self {
            speed_mm_s,
            line_width_um,
            comment: comment.to_string(),
            spiralize: false,
            closed_loop: true,
        }
    }

    /// The travel configuration: no extrusion, so the line width is zero.
    pub fn travel(speed_mm_s: i64) -> Self {
        Self {
            speed_mm_s,
            line_width_um: 0,
            comment: String::new(),
            spiralize: false,
            closed_loop: false,
        }
    }

    pub fn with_spiralize(mut self, spiralize: bool) -> Self {
        self.spiralize = spiralize;
        self
    }

    pub fn with_closed_loop(mut self, closed_loop: bool) -> Self {
        self.closed_loop = closed_loop;
        self
    }

    pub fn is_bridge(&self) -> bool {
        self.comment == BRIDGE
    }

    pub fn is_wall(&self) -> bool {
        self.comment == WALL_OUTER || self.comment == WALL_INNER
    }
}
