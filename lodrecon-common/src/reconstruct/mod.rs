//! The reconstructor (`spec.md` §4.6, C6): picks between low-detail
//! extrusion (Path A) and planar partitioning (Path B), falling back to
//! Path A whenever Path B can't produce a usable mesh.

pub mod arrangement;
pub mod extrude;
pub mod labeling;
pub mod planes;

use crate::config::Config;
use crate::elevation::ElevationProvider;
use crate::geometry::point::classification;
use crate::model::{BuildingCrop, BuildingMesh};
use crate::point_in_polygon::PointInPolygon;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs C6 against one crop. `cancel` is polled at the sub-steps the
/// scheduler names as cancellation points (`spec.md` §4.8): before plane
/// detection, before the arrangement is built, and before extrusion.
/// Returns `None` if `cancel` was observed set at any of them.
pub fn reconstruct(
    crop: &BuildingCrop,
    elevation: &ElevationProvider,
    config: &Config,
    cancel: &AtomicBool,
) -> Option<BuildingMesh> {
    if cancel.load(Ordering::Relaxed) {
        return None;
    }

    let floor_elevation = crop.ground_elevation.unwrap_or_else(|| {
        let centroid = crop.footprint.ring.bbox().center();
        elevation.get(centroid)
    });

    let roof_points = crop.points.filter_by_classification(&[classification::BUILDING]);

    let low_lod_requested = crop.force_low_lod
        || crop.nodata_fraction > config.max_nodata_fraction as f64
        || crop.point_density < config.max_point_density_low_lod as f64;

    if low_lod_requested {
        return Some(low_lod(crop, &roof_points, floor_elevation));
    }

    if cancel.load(Ordering::Relaxed) {
        return None;
    }
    let neighbor_radius = (config.cellsize as f64 * 2.0).max(1e-3);
    let planes = planes::detect_planes(
        &roof_points.xyz,
        config.tol_planarity_d2p as f64,
        config.tol_planarity_normals as f64,
        neighbor_radius,
    );
    if planes.is_empty() {
        return Some(fallback(crop, &roof_points, floor_elevation, "plane detection produced no planes"));
    }

    if cancel.load(Ordering::Relaxed) {
        return None;
    }
    let pip = PointInPolygon::build(&crop.footprint.ring);
    let bbox = crop.footprint.ring.bbox();
    let arrangement = match arrangement::build(&bbox, config.cellsize as f64, &pip, &planes, &roof_points.xyz) {
        Ok(a) => a,
        Err(reason) => return Some(fallback(crop, &roof_points, floor_elevation, &reason)),
    };

    let labels = labeling::assign_labels(&arrangement, planes.len(), config.boundary_penalty as f64);

    if cancel.load(Ordering::Relaxed) {
        return None;
    }
    let mesh = extrude::assemble_and_extrude(
        &arrangement,
        &labels,
        &planes,
        floor_elevation,
        config.min_roof_polygon_area as f64,
    );

    if mesh.face_count() == 0 {
        return Some(fallback(crop, &roof_points, floor_elevation, "no roof polygon survived the minimum area filter"));
    }

    Some(BuildingMesh {
        footprint: crop.footprint.clone(),
        mesh,
        used_fallback: false,
        fallback_reason: None,
    })
}

fn low_lod(
    crop: &BuildingCrop,
    roof_points: &crate::geometry::point::PointCollection,
    floor_elevation: f64,
) -> BuildingMesh {
    let roof_elevation = roof_points.percentile_z(0.7).unwrap_or(floor_elevation);
    let mesh = extrude::low_lod_mesh(&crop.footprint.ring.outer, floor_elevation, roof_elevation);
    BuildingMesh {
        footprint: crop.footprint.clone(),
        mesh,
        used_fallback: false,
        fallback_reason: None,
    }
}

/// Path B failed somewhere; fall back to Path A and annotate the result
/// (`spec.md` §4.6 "Failure semantics").
fn fallback(
    crop: &BuildingCrop,
    roof_points: &crate::geometry::point::PointCollection,
    floor_elevation: f64,
    reason: &str,
) -> BuildingMesh {
    let roof_elevation = roof_points.percentile_z(0.7).unwrap_or(floor_elevation);
    let mesh = extrude::low_lod_mesh(&crop.footprint.ring.outer, floor_elevation, roof_elevation);
    BuildingMesh {
        footprint: crop.footprint.clone(),
        mesh,
        used_fallback: true,
        fallback_reason: Some(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::Footprint;
    use crate::geometry::point::PointCollection;
    use crate::geometry::raster::ImageMap;
    use crate::geometry::ring::LinearRing;
    use nalgebra::Point3;
    use std::sync::Arc;

    fn footprint() -> Arc<Footprint> {
        let ring = LinearRing::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        Arc::new(Footprint::new("b1", ring))
    }

    fn flat_roof_crop(force_low_lod: bool) -> BuildingCrop {
        let mut points = PointCollection::new();
        let mut x = 0.0;
        while x < 10.0 {
            let mut y = 0.0;
            while y < 10.0 {
                points.push(Point3::new(x, y, 5.0), classification::BUILDING, 0);
                y += 1.0;
            }
            x += 1.0;
        }
        BuildingCrop {
            footprint: footprint(),
            points,
            raster: ImageMap::new("count", 10, 10, [0.0, 0.0], 1.0, -1.0),
            nodata_radius: 0.1,
            nodata_center: Some([5.0, 5.0]),
            nodata_fraction: 0.0,
            point_density: 10.0,
            ground_elevation: Some(0.0),
            acquisition_year: 2020,
            is_mutated: false,
            force_low_lod,
        }
    }

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn forced_low_lod_uses_path_a() {
        let crop = flat_roof_crop(true);
        let config = Config::default();
        let elevation = ElevationProvider::constant(0.0);
        let result = reconstruct(&crop, &elevation, &config, &no_cancel()).unwrap();
        assert!(!result.used_fallback);
        assert_eq!(result.mesh.faces_for_surface_type(crate::geometry::mesh::SurfaceType::Roof).count(), 1);
    }

    #[test]
    fn flat_roof_with_enough_density_takes_path_b() {
        let crop = flat_roof_crop(false);
        let config = Config::default();
        let elevation = ElevationProvider::constant(0.0);
        let result = reconstruct(&crop, &elevation, &config, &no_cancel()).unwrap();
        assert!(result.mesh.face_count() > 0);
    }

    #[test]
    fn missing_ground_elevation_falls_back_to_elevation_provider() {
        let mut crop = flat_roof_crop(true);
        crop.ground_elevation = None;
        let config = Config::default();
        let elevation = ElevationProvider::constant(1.5);
        let result = reconstruct(&crop, &elevation, &config, &no_cancel()).unwrap();
        let (floor_idx, _) = result
            .mesh
            .faces_for_surface_type(crate::geometry::mesh::SurfaceType::Floor)
            .next()
            .unwrap();
        for v in result.mesh.face_vertices(floor_idx) {
            assert_eq!(v.z, 1.5);
        }
    }

    #[test]
    fn cancelled_before_start_returns_none() {
        let crop = flat_roof_crop(false);
        let config = Config::default();
        let elevation = ElevationProvider::constant(0.0);
        let cancel = AtomicBool::new(true);
        assert!(reconstruct(&crop, &elevation, &config, &cancel).is_none());
    }
}
