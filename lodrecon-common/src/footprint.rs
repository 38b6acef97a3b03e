//! Building footprints (`spec.md` §3): a 2D outer ring, zero or more
//! holes, and the attributes the cropper and reconstructor need.

use crate::geometry::ring::LinearRing;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Footprint {
    pub id: String,
    pub ring: LinearRing,
    pub construction_year: Option<i32>,
    pub force_low_lod: bool,
}

impl Footprint {
    pub fn new(id: impl Into<String>, ring: LinearRing) -> Self {
        Footprint {
            id: id.into(),
            ring,
            construction_year: None,
            force_low_lod: false,
        }
    }
}

/// A shared, read-only handle, cheap to pass into every crop worker
/// without cloning the ring's vertex data (`spec.md` §5).
pub type FootprintHandle = Arc<Footprint>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_footprint_has_no_attributes_set() {
        let ring = LinearRing::new(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let fp = Footprint::new("bldg-1", ring);
        assert_eq!(fp.id, "bldg-1");
        assert!(fp.construction_year.is_none());
        assert!(!fp.force_low_lod);
    }
}
