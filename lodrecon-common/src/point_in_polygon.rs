//! Point-in-polygon classification against a footprint `LinearRing`
//! (`spec.md` §4.3). The naive ray-casting test is `O(#edges)` per point,
//! which is too slow for the per-point crop test over a full tile; this
//! indexes the ring's edges in a [`SpatialIndex`] the same way the
//! cropper indexes point-cloud sources, then only ray-casts against the
//! edges whose bounding box actually straddles the query's scanline.

use crate::geometry::bounding_box::Aabb2;
use crate::geometry::ring::LinearRing;
use crate::spatial_index::SpatialIndex;

struct Edge {
    a: [f64; 2],
    b: [f64; 2],
}

/// A point-in-polygon tester built once per footprint and reused for
/// every point in the crop window.
pub struct PointInPolygon {
    outer_edges: Vec<Edge>,
    hole_edges: Vec<Vec<Edge>>,
    index: SpatialIndex<(bool, usize, usize)>,
    bbox: Aabb2,
}

impl PointInPolygon {
    pub fn build(ring: &LinearRing) -> Self {
        let outer_edges: Vec<Edge> = ring
            .outer_edges()
            .map(|(a, b)| Edge { a, b })
            .collect();
        let hole_edges: Vec<Vec<Edge>> = (0..ring.holes.len())
            .map(|h| ring.hole_edges(h).map(|(a, b)| Edge { a, b }).collect())
            .collect();

        let mut items = Vec::new();
        for (i, e) in outer_edges.iter().enumerate() {
            items.push((edge_bbox(e), (true, 0, i)));
        }
        for (h, edges) in hole_edges.iter().enumerate() {
            for (i, e) in edges.iter().enumerate() {
                items.push((edge_bbox(e), (false, h, i)));
            }
        }
        let index = SpatialIndex::bulk(items);

        PointInPolygon {
            outer_edges,
            hole_edges,
            index,
            bbox: ring.bbox(),
        }
    }

    /// True if `p` lies inside the outer ring and outside every hole,
    /// using the even-odd ray-casting rule (`spec.md` §4.3 edge case:
    /// points exactly on a boundary edge count as inside).
    pub fn contains(&self, p: [f64; 2]) -> bool {
        if !self.bbox.contains_point(p) {
            return false;
        }
        let query = Aabb2::new([self.bbox.min[0], p[1]], [self.bbox.max[0], p[1]]);
        let candidates = self.index.query(query);
        if candidates.is_empty() {
            return false;
        }

        let mut in_outer = false;
        let mut in_hole = vec![false; self.hole_edges.len()];
        for (is_outer, hole_idx, edge_idx) in candidates {
            let edge = if is_outer {
                &self.outer_edges[edge_idx]
            } else {
                &self.hole_edges[hole_idx][edge_idx]
            };
            if on_boundary(edge, p) {
                return true;
            }
            if ray_crosses(edge, p) {
                if is_outer {
                    in_outer = !in_outer;
                } else {
                    in_hole[hole_idx] = !in_hole[hole_idx];
                }
            }
        }
        in_outer && !in_hole.into_iter().any(|x| x)
    }
}

fn edge_bbox(e: &Edge) -> Aabb2 {
    Aabb2::from_points([e.a, e.b])
}

fn on_boundary(e: &Edge, p: [f64; 2]) -> bool {
    let (a, b) = (e.a, e.b);
    let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    if cross.abs() > 1e-9 {
        return false;
    }
    let dot = (p[0] - a[0]) * (b[0] - a[0]) + (p[1] - a[1]) * (b[1] - a[1]);
    let sq_len = (b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2);
    dot >= -1e-9 && dot <= sq_len + 1e-9
}

/// Standard even-odd ray cast: does the horizontal ray from `p` going in
/// +x cross this edge?
fn ray_crosses(e: &Edge, p: [f64; 2]) -> bool {
    let (a, b) = (e.a, e.b);
    if (a[1] > p[1]) == (b[1] > p[1]) {
        return false;
    }
    let x_at_p_y = a[0] + (p[1] - a[1]) / (b[1] - a[1]) * (b[0] - a[0]);
    x_at_p_y > p[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> LinearRing {
        LinearRing::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]])
    }

    #[test]
    fn inside_simple_square() {
        let pip = PointInPolygon::build(&square());
        assert!(pip.contains([5.0, 5.0]));
        assert!(!pip.contains([15.0, 5.0]));
    }

    #[test]
    fn boundary_counts_as_inside() {
        let pip = PointInPolygon::build(&square());
        assert!(pip.contains([0.0, 5.0]));
        assert!(pip.contains([10.0, 10.0]));
    }

    #[test]
    fn hole_excludes_interior() {
        let ring = LinearRing::with_holes(
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            vec![vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]],
        );
        let pip = PointInPolygon::build(&ring);
        assert!(!pip.contains([5.0, 5.0]));
        assert!(pip.contains([1.0, 1.0]));
    }

    #[test]
    fn outside_bbox_is_fast_rejected() {
        let pip = PointInPolygon::build(&square());
        assert!(!pip.contains([-1.0, -1.0]));
    }
}
