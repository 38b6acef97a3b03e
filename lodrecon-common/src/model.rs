//! The data objects that flow between pipeline stages (`spec.md` §3):
//! `BuildingCrop` (C4 → C6), `BuildingMesh`/`BuildingResult` (C6 → C7 →
//! sink). Point-cloud buffers inside these are single-owner and move
//! through the scheduler's queues by value, never by clone (`spec.md`
//! §5, §9).

use crate::error::ValidationError;
use crate::footprint::FootprintHandle;
use crate::geometry::mesh::Mesh;
use crate::geometry::point::PointCollection;
use crate::geometry::raster::ImageMap;

/// Output of C4 for a footprint that did get usable coverage.
#[derive(Debug, Clone)]
pub struct BuildingCrop {
    pub footprint: FootprintHandle,
    pub points: PointCollection,
    pub raster: ImageMap,
    pub nodata_radius: f64,
    pub nodata_center: Option<[f64; 2]>,
    pub nodata_fraction: f64,
    pub point_density: f64,
    pub ground_elevation: Option<f64>,
    pub acquisition_year: i32,
    pub is_mutated: bool,
    pub force_low_lod: bool,
}

/// The result of running C4 on one footprint: either a usable crop, or a
/// `NoData` annotation (`spec.md` §4.4 Error conditions, §7: "`NoData`...
/// produce an output with annotations, not a failure").
#[derive(Debug, Clone)]
pub enum CropOutcome {
    Cropped(BuildingCrop),
    NoData { footprint: FootprintHandle, reason: String },
}

/// Output of C6: a tagged mesh plus the annotations carried forward from
/// the crop and from any Path B → Path A fallback (`spec.md` §4.6
/// "Failure semantics").
#[derive(Debug, Clone)]
pub struct BuildingMesh {
    pub footprint: FootprintHandle,
    pub mesh: Mesh,
    pub used_fallback: bool,
    pub fallback_reason: Option<String>,
}

/// Output of C7: a mesh plus its validation report (`spec.md` §3, §4.7).
#[derive(Debug, Clone)]
pub struct BuildingResult {
    pub footprint_id: String,
    pub mesh: Mesh,
    pub errors: Vec<ValidationError>,
}

impl BuildingResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
