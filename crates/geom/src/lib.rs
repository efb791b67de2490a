//! # Layer Geometry Crate
//!
//! Fixed-point geometry primitives for toolpath planning. All coordinates
//! are 64-bit signed integers in micrometers, which keeps layer geometry
//! exact under addition, comparison, and midpoint operations.
//!
//! Provides:
//! - 2D and 3D integer points with vector arithmetic
//! - Directed segments with an extrusion-width annotation
//! - Segment splitting at the projections of nearby vertices, used to
//!   precondition perimeters before overlap merging

pub mod point;
pub mod point3;
pub mod segment;

// Re-export core types for easier access
pub use point::Point2;
pub use point3::Point3;
pub use segment::{make_close_segments_mergeable, points_to_segments, split_segment_for_vertices, Segment};

/// A closed or open sequence of 2D layer coordinates.
pub type Polygon = Vec<Point2>;

/// A set of polygons, e.g. all islands of one layer.
pub type Polygons = Vec<Polygon>;
