use crate::geometry::bounding_box::Aabb2;

/// A 2D linear ring, first and last vertex not duplicated (implicit
/// closure), plus zero or more inner (hole) rings — `spec.md` §4.1.
#[derive(Debug, Clone)]
pub struct LinearRing {
    pub outer: Vec<[f64; 2]>,
    pub holes: Vec<Vec<[f64; 2]>>,
}

impl LinearRing {
    pub fn new(outer: Vec<[f64; 2]>) -> Self {
        LinearRing {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<[f64; 2]>, holes: Vec<Vec<[f64; 2]>>) -> Self {
        LinearRing { outer, holes }
    }

    pub fn bbox(&self) -> Aabb2 {
        Aabb2::from_points(self.outer.iter().copied())
    }

    /// Unsigned area of the outer ring minus the area of its holes, via
    /// the shoelace formula.
    pub fn area(&self) -> f64 {
        ring_area(&self.outer) - self.holes.iter().map(|h| ring_area(h)).sum::<f64>()
    }

    /// Edges of the outer ring as `(start, end)` vertex pairs, including
    /// the implicit closing edge.
    pub fn outer_edges(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        ring_edges(&self.outer)
    }

    pub fn hole_edges(&self, hole_idx: usize) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        ring_edges(&self.holes[hole_idx])
    }

    /// Returns a new ring where every edge longer than `max_seg_len` is
    /// subdivided into equal-length segments, used by the no-data disc
    /// computation (`spec.md` §4.4 step 7: `polygon_densify`).
    pub fn densify(&self, max_seg_len: f64) -> LinearRing {
        LinearRing {
            outer: densify_ring(&self.outer, max_seg_len),
            holes: self
                .holes
                .iter()
                .map(|h| densify_ring(h, max_seg_len))
                .collect(),
        }
    }

    pub fn all_vertices(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.outer
            .iter()
            .copied()
            .chain(self.holes.iter().flat_map(|h| h.iter().copied()))
    }
}

fn ring_area(ring: &[[f64; 2]]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (a, b) in ring_edges(ring) {
        sum += a[0] * b[1] - b[0] * a[1];
    }
    (sum / 2.0).abs()
}

fn ring_edges(ring: &[[f64; 2]]) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

fn densify_ring(ring: &[[f64; 2]], max_seg_len: f64) -> Vec<[f64; 2]> {
    if ring.is_empty() || max_seg_len <= 0.0 {
        return ring.to_vec();
    }
    let mut out = Vec::with_capacity(ring.len() * 2);
    for (a, b) in ring_edges(ring) {
        out.push(a);
        let dx = b[0] - a[0];
        let dy = b[1] - a[1];
        let len = (dx * dx + dy * dy).sqrt();
        let n_extra = (len / max_seg_len).floor() as usize;
        for i in 1..=n_extra {
            let t = i as f64 / (n_extra + 1) as f64;
            out.push([a[0] + dx * t, a[1] + dy * t]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_of_square() {
        let ring = LinearRing::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        assert_eq!(ring.area(), 100.0);
    }

    #[test]
    fn area_with_hole() {
        let ring = LinearRing::with_holes(
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            vec![vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]],
        );
        assert_eq!(ring.area(), 96.0);
    }

    #[test]
    fn densify_respects_max_len() {
        let ring = LinearRing::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let dense = ring.densify(1.0);
        for (a, b) in dense.outer_edges() {
            let d = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
            assert!(d <= 1.0 + 1e-9);
        }
        assert!(dense.outer.len() > ring.outer.len());
    }

    #[test]
    fn bbox_matches_extent() {
        let ring = LinearRing::new(vec![[1.0, 2.0], [5.0, 2.0], [5.0, 9.0], [1.0, 9.0]]);
        let bbox = ring.bbox();
        assert_eq!(bbox.min, [1.0, 2.0]);
        assert_eq!(bbox.max, [5.0, 9.0]);
    }
}
