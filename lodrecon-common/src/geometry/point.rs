use nalgebra::Point3;

/// LAS-style classification codes relevant to the reconstruction pipeline
/// (`spec.md` §3). The crate only cares about the ground/building
/// distinction; other LAS classes pass through the reader unchanged and
/// are simply ignored by the cropper.
pub mod classification {
    pub const GROUND: u8 = 2;
    pub const BUILDING: u8 = 6;
}

/// A sequence of 3D points together with parallel per-point attribute
/// arrays, columnar rather than array-of-structs, limited to the two
/// attributes reconstruction actually needs, so that a whole
/// `PointCollection` is a single contiguous allocation that can be handed
/// off through the scheduler's queues without per-point indirection.
#[derive(Debug, Clone, Default)]
pub struct PointCollection {
    pub xyz: Vec<Point3<f64>>,
    pub classification: Vec<u8>,
    /// Quality label of the source that contributed this point (lower is
    /// better, see `spec.md` §3 "Point cloud source descriptor").
    pub source_quality: Vec<u8>,
}

impl PointCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        PointCollection {
            xyz: Vec::with_capacity(cap),
            classification: Vec::with_capacity(cap),
            source_quality: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.xyz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xyz.is_empty()
    }

    pub fn push(&mut self, p: Point3<f64>, classification: u8, source_quality: u8) {
        self.xyz.push(p);
        self.classification.push(classification);
        self.source_quality.push(source_quality);
    }

    pub fn extend_from(&mut self, other: &PointCollection) {
        self.xyz.extend_from_slice(&other.xyz);
        self.classification.extend_from_slice(&other.classification);
        self.source_quality
            .extend_from_slice(&other.source_quality);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Point3<f64>, u8, u8)> {
        self.xyz
            .iter()
            .zip(self.classification.iter().copied())
            .zip(self.source_quality.iter().copied())
            .map(|((p, c), q)| (p, c, q))
    }

    /// Returns a new collection retaining only points whose classification
    /// is in `classes`.
    pub fn filter_by_classification(&self, classes: &[u8]) -> PointCollection {
        let mut out = PointCollection::new();
        for (p, c, q) in self.iter() {
            if classes.contains(&c) {
                out.push(*p, c, q);
            }
        }
        out
    }

    pub fn median_z(&self) -> Option<f64> {
        if self.xyz.is_empty() {
            return None;
        }
        let mut zs: Vec<f64> = self.xyz.iter().map(|p| p.z).collect();
        Some(median(&mut zs))
    }

    /// The `q`-th percentile (0.0..=1.0) of the Z coordinates, using
    /// linear interpolation between closest ranks.
    pub fn percentile_z(&self, q: f64) -> Option<f64> {
        if self.xyz.is_empty() {
            return None;
        }
        let mut zs: Vec<f64> = self.xyz.iter().map(|p| p.z).collect();
        Some(percentile(&mut zs, q))
    }
}

/// Computes the median of `values` in place (partial reorder only).
pub fn median(values: &mut [f64]) -> f64 {
    percentile(values, 0.5)
}

/// Computes the `q`-th percentile (0.0..=1.0) of `values` in place, via
/// linear interpolation between the two closest ranks.
pub fn percentile(values: &mut [f64], q: f64) -> f64 {
    assert!(!values.is_empty());
    let q = q.clamp(0.0, 1.0);
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if values.len() == 1 {
        return values[0];
    }
    let rank = q * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        let frac = rank - lo as f64;
        values[lo] * (1.0 - frac) + values[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_filter() {
        let mut pc = PointCollection::new();
        pc.push(Point3::new(0.0, 0.0, 1.0), classification::GROUND, 0);
        pc.push(Point3::new(0.0, 0.0, 2.0), classification::BUILDING, 0);
        pc.push(Point3::new(0.0, 0.0, 3.0), 9, 0);
        assert_eq!(pc.len(), 3);
        let ground = pc.filter_by_classification(&[classification::GROUND]);
        assert_eq!(ground.len(), 1);
        assert_eq!(ground.xyz[0].z, 1.0);
    }

    #[test]
    fn percentile_matches_median() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&mut v, 0.5), 2.5);
        let mut v2 = vec![5.0];
        assert_eq!(percentile(&mut v2, 0.7), 5.0);
    }

    #[test]
    fn median_z_of_points() {
        let mut pc = PointCollection::new();
        pc.push(Point3::new(0.0, 0.0, 10.0), classification::GROUND, 0);
        pc.push(Point3::new(0.0, 0.0, 11.0), classification::GROUND, 0);
        pc.push(Point3::new(0.0, 0.0, 12.0), classification::GROUND, 0);
        assert_eq!(pc.median_z(), Some(11.0));
    }
}
