//! Polygon visit ordering.

use geom::{Point2, Polygon};

/// One entry of a visit plan: which polygon to print next and the vertex to
/// start it at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PolygonStart {
    pub polygon_index: usize,
    pub vertex_index: usize,
}

/// Picks the order in which a layer's polygons are printed and where each
/// one is entered.
pub trait IslandOrderOptimizer {
    fn visit_order(&self, polygons: &[Polygon], start: Point2) -> Vec<PolygonStart>;
}

/// Greedy nearest-vertex ordering: repeatedly visit the polygon whose
/// closest vertex is nearest to the current head position, entering it at
/// that vertex. Empty polygons are skipped.
#[derive(Debug, Default)]
pub struct NearestIslandOrder;

impl IslandOrderOptimizer for NearestIslandOrder {
    fn visit_order(&self, polygons: &[Polygon], start: Point2) -> Vec<PolygonStart> {
        let mut remaining: Vec<usize> = (0..polygons.len())
            .filter(|&index| !polygons[index].is_empty())
            .collect();
        let mut order = Vec::with_capacity(remaining.len());
        let mut position = start;

        while !remaining.is_empty() {
            let mut best_slot = 0;
            let mut best_vertex = 0;
            let mut best_distance = i64::MAX;
            for (slot, &polygon_index) in remaining.iter().enumerate() {
                for (vertex_index, &vertex) in polygons[polygon_index].iter().enumerate() {
                    let distance = (vertex - position).length_squared();
                    if distance < best_distance {
                        best_distance = distance;
                        best_slot = slot;
                        best_vertex = vertex_index;
                    }
                }
            }
            let polygon_index = remaining.swap_remove(best_slot);
            order.push(PolygonStart {
                polygon_index,
                vertex_index: best_vertex,
            });
            position = polygons[polygon_index][best_vertex];
        }
        order
    }
}
