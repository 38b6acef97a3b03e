use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// An axis-aligned 2D bounding box, in the working (already-projected)
/// coordinate reference shared by footprints and point clouds.
///
/// No assertion is made that `min <= max`; a box with `min > max` on any
/// axis is considered empty, so an empty box needs no separate sentinel.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn from_points<I: IntoIterator<Item = [f64; 2]>>(points: I) -> Self {
        let mut bbox = Aabb2::empty();
        for p in points {
            bbox.extend(p);
        }
        bbox
    }

    pub fn extend(&mut self, p: [f64; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    pub fn extend_box(&mut self, other: &Aabb2) {
        if other.is_empty() {
            return;
        }
        self.extend(other.min);
        self.extend(other.max);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        let mut out = *self;
        out.extend_box(other);
        out
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn contains_point(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Grows the box outwards by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Aabb2 {
        if self.is_empty() {
            return *self;
        }
        Aabb2 {
            min: [self.min[0] - margin, self.min[1] - margin],
            max: [self.max[0] + margin, self.max[1] + margin],
        }
    }
}

impl Debug for Aabb2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "Aabb2 (empty)")
        } else {
            write!(
                f,
                "Aabb2 ({:?},{:?} - {:?},{:?})",
                self.min[0], self.min[1], self.max[0], self.max[1]
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_empty() {
        let bbox = Aabb2::empty();
        assert!(bbox.is_empty());
    }

    #[test]
    fn extend() {
        let mut bbox = Aabb2::empty();
        bbox.extend([1.0, 2.0]);
        assert_eq!(bbox.min, [1.0, 2.0]);
        assert_eq!(bbox.max, [1.0, 2.0]);
        bbox.extend([3.0, 0.0]);
        assert_eq!(bbox.min, [1.0, 0.0]);
        assert_eq!(bbox.max, [3.0, 2.0]);
    }

    #[test]
    fn intersects() {
        let a = Aabb2::new([0.0, 0.0], [2.0, 2.0]);
        let b = Aabb2::new([1.0, 1.0], [3.0, 3.0]);
        let c = Aabb2::new([2.1, 2.1], [4.0, 4.0]);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn expand() {
        let a = Aabb2::new([0.0, 0.0], [2.0, 2.0]);
        let b = a.expand(1.0);
        assert_eq!(b.min, [-1.0, -1.0]);
        assert_eq!(b.max, [3.0, 3.0]);
    }
}
