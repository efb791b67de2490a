//! Harness Utilities
//!
//! Polygon builders, a simple rectangular boundary oracle, and trace
//! dumping for scenario tests and examples.

use crate::fake_writer::WriteEvent;
use anyhow::Result;
use geom::{Point2, Polygon};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use toolpath::PerimeterAvoidance;
use tracing::info;

/// An axis-aligned square with its corner at `origin`, counter-clockwise.
pub fn square(origin: Point2, size: i64) -> Polygon {
    vec![
        origin,
        Point2::new(origin.x + size, origin.y),
        Point2::new(origin.x + size, origin.y + size),
        Point2::new(origin.x, origin.y + size),
    ]
}

/// An axis-aligned rectangle serving as a part boundary. Convex, so any
/// straight move between interior points stays inside.
#[derive(Debug, Copy, Clone)]
pub struct RectBoundary {
    pub min: Point2,
    pub max: Point2,
}

impl RectBoundary {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }
}

impl PerimeterAvoidance for RectBoundary {
    fn point_is_inside(&self, point: Point2) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }

    fn move_point_inside(&self, point: &mut Point2, distance_um: i64) -> bool {
        let lo = self.min + Point2::new(distance_um, distance_um);
        let hi = self.max - Point2::new(distance_um, distance_um);
        if lo.x > hi.x || lo.y > hi.y {
            return false;
        }
        point.x = point.x.clamp(lo.x, hi.x);
        point.y = point.y.clamp(lo.y, hi.y);
        true
    }

    fn route_inside(&self, from: Point2, to: Point2) -> Option<Vec<Point2>> {
        if self.point_is_inside(from) && self.point_is_inside(to) {
            // Straight travel stays inside a convex boundary, no via
            // points needed.
            Some(Vec::new())
        } else {
            None
        }
    }
}

/// Dumps a recorded event trace to a JSON file for offline inspection.
pub fn dump_trace(events: &[WriteEvent], path: &Path) -> Result<()> {
    info!(path = %path.display(), "dumping event trace");
    let mut file = File::create(path)?;
    let json = serde_json::to_string_pretty(events)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
