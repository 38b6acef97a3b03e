//! Point-cloud source descriptors (`spec.md` §3). Loaded once at start and
//! shared read-only for the whole run (`spec.md` §5: "Footprints and
//! source descriptors are reference-counted shared read-only handles").

use std::sync::Arc;

/// A named point-cloud acquisition and the metadata the cropper's
/// arbitration algorithm needs to rank it against overlapping sources.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudSource {
    pub name: String,
    /// Opaque handle the `PointCloudReader` collaborator resolves; this
    /// crate never interprets it.
    pub location: String,
    /// Lower is better (`spec.md` §3).
    pub quality: i32,
    pub acquisition_year: i32,
    pub ground_class: u8,
    pub building_class: u8,
    pub force_low_lod: bool,
    /// Restricts this source to being considered only when the crop
    /// request's target date matches (`spec.md` §4.4 step 4).
    pub select_only_for_date: bool,
}

impl PointCloudSource {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        PointCloudSource {
            name: name.into(),
            location: location.into(),
            quality: 0,
            acquisition_year: 0,
            ground_class: crate::geometry::point::classification::GROUND,
            building_class: crate::geometry::point::classification::BUILDING,
            force_low_lod: false,
            select_only_for_date: false,
        }
    }
}

/// The immutable, shared list of sources consulted by every crop worker,
/// an `Arc` handle per `spec.md` §5 so no source data is cloned per
/// building.
pub type SourceIndex = Arc<Vec<PointCloudSource>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classification_matches_las_codes() {
        let source = PointCloudSource::new("a", "a.las");
        assert_eq!(source.ground_class, 2);
        assert_eq!(source.building_class, 6);
    }
}
