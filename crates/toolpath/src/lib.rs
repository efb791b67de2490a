//! # Toolpath Planner Crate
//!
//! Turns layer geometry (closed polygons and open paths in micrometer
//! coordinates) into an ordered stream of printer motion: travel moves,
//! extrusion moves, retractions, extruder switches, and fan changes,
//! written through a pluggable [`GCodeWriter`].
//!
//! Moves are not written immediately. The [`LayerPlanner`] buffers them as
//! paths grouped by extrusion configuration so that post-processing passes
//! can rewrite them before anything reaches the writer:
//!
//! 1. Travels are routed inside a boundary when a [`PerimeterAvoidance`]
//!    oracle is installed, and retractions are inserted only when needed.
//! 2. [`force_minimum_layer_time`](LayerPlanner::force_minimum_layer_time)
//!    scales extrusion speeds down (never below a floor) so small layers
//!    get enough cooling time.
//! 3. [`write_queued`](LayerPlanner::write_queued) walks the buffer once,
//!    applying speed factors, spiral Z interpolation, small-move
//!    coalescing, and outer-wall endpoint trimming while emitting.
//!
//! The planner is single-threaded, owns its buffer exclusively, and is
//! consumed by the single flush.

pub mod avoidance;
pub mod config;
pub mod emit;
pub mod order;
pub mod overlap;
pub mod path;
pub mod planner;
pub mod settings;
pub mod writer;

// Re-export core types for easier access
pub use avoidance::PerimeterAvoidance;
pub use config::PathConfig;
pub use order::{IslandOrderOptimizer, NearestIslandOrder, PolygonStart};
pub use overlap::remove_perimeter_overlaps;
pub use path::{GCodePath, PathAndWidth};
pub use planner::LayerPlanner;
pub use settings::{PlannerSettings, SettingsError};
pub use writer::GCodeWriter;
