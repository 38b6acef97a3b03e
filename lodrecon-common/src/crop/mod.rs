//! Per-footprint point selection and rasterisation (`spec.md` §4.4, C4):
//! read candidate sources, arbitrate between overlapping ones,
//! rasterise, and locate the largest no-data disc.

pub mod arbitration;
pub mod nodata;

use crate::config::Config;
use crate::error::CropError;
use crate::footprint::FootprintHandle;
use crate::geometry::bounding_box::Aabb2;
use crate::geometry::point::{classification, PointCollection};
use crate::geometry::raster::ImageMap;
use crate::io::PointCloudReader;
use crate::model::{BuildingCrop, CropOutcome};
use crate::point_in_polygon::PointInPolygon;
use crate::source::SourceIndex;

struct SourceReadResult {
    points: PointCollection,
    density: f64,
    point_count: usize,
}

/// Runs the full C4 algorithm for one footprint against the given
/// `sources`. `target_date`, when set, is the acquisition year step 4
/// restricts eligible sources to.
pub fn crop_building(
    sources: &SourceIndex,
    reader: &dyn PointCloudReader,
    footprint: &FootprintHandle,
    target_date: Option<i32>,
    config: &Config,
) -> Result<CropOutcome, CropError> {
    if footprint.ring.outer.len() < 3 {
        return Err(CropError::DegenerateFootprint(footprint.id.clone()));
    }

    let pip = PointInPolygon::build(&footprint.ring);
    let area = footprint.ring.area();
    let query_box = footprint
        .ring
        .bbox()
        .expand(config.boundary_crop_margin as f64);

    let mut reads = Vec::with_capacity(sources.len());
    for source in sources.iter() {
        let raw = reader
            .read_points(&source.location, query_box.min, query_box.max)
            .map_err(CropError::Io)?;
        let filtered = filter_points(&raw, source, &pip);
        let point_count = filtered
            .classification
            .iter()
            .filter(|&&c| c == source.building_class)
            .count();
        let density = point_count as f64 / area.max(1e-9);
        reads.push(SourceReadResult {
            points: filtered,
            density,
            point_count,
        });
    }

    let candidates: Vec<arbitration::Candidate> = reads
        .iter()
        .zip(sources.iter())
        .map(|(r, s)| arbitration::Candidate {
            density: r.density,
            quality: s.quality,
            point_count: r.point_count,
            acquisition_year: s.acquisition_year,
            select_only_for_date: s.select_only_for_date,
        })
        .collect();

    let arbitrated = arbitration::arbitrate(
        &candidates,
        target_date,
        config.min_source_density as f64,
        config.max_point_density as f64,
        config.max_point_density_low_lod as f64,
    );

    let arbitrated = match arbitrated {
        Some(a) => a,
        None => {
            return Ok(CropOutcome::NoData {
                footprint: footprint.clone(),
                reason: "no source meets the minimum density".to_string(),
            })
        }
    };

    let chosen_source = &sources[arbitrated.chosen_index];
    let chosen = &reads[arbitrated.chosen_index];

    let raster = rasterize(&chosen.points, &pip, &query_box, config.cellsize as f64, chosen_source.building_class);
    let inside_cells: Vec<(usize, usize)> = raster
        .cells()
        .filter(|&(col, row)| pip.contains(raster.cell_center(col, row)))
        .collect();
    let zero_cells = inside_cells
        .iter()
        .filter(|&&(col, row)| raster.get(col, row) == 0.0)
        .count();
    let nodata_fraction = if inside_cells.is_empty() {
        0.0
    } else {
        zero_cells as f64 / inside_cells.len() as f64
    };

    let samples: Vec<[f64; 2]> = chosen
        .points
        .iter()
        .filter(|(_, c, _)| *c == chosen_source.building_class)
        .map(|(p, _, _)| [p.x, p.y])
        .collect();
    let disc = nodata::largest_empty_disc(
        &footprint.ring,
        &pip,
        &raster,
        &samples,
        config.polygon_densify as f64,
    );

    let ground_elevation = ground_elevation(&chosen.points, footprint, chosen_source.ground_class);

    let force_low_lod = footprint.force_low_lod
        || chosen_source.force_low_lod
        || chosen.density < config.max_point_density_low_lod as f64
        || area > config.low_lod_area as f64;

    Ok(CropOutcome::Cropped(BuildingCrop {
        footprint: footprint.clone(),
        points: chosen.points.clone(),
        raster,
        nodata_radius: disc.radius,
        nodata_center: disc.center,
        nodata_fraction,
        point_density: chosen.density,
        ground_elevation,
        acquisition_year: chosen_source.acquisition_year,
        is_mutated: arbitrated.is_mutated,
        force_low_lod,
    }))
}

/// Discards points whose classification isn't ground/building for this
/// source, or whose projection fails the point-in-polygon test
/// (`spec.md` §4.4 step 2).
fn filter_points(
    raw: &PointCollection,
    source: &crate::source::PointCloudSource,
    pip: &PointInPolygon,
) -> PointCollection {
    let mut out = PointCollection::with_capacity(raw.len());
    for (p, c, q) in raw.iter() {
        if c != source.ground_class && c != source.building_class {
            continue;
        }
        if !pip.contains([p.x, p.y]) {
            continue;
        }
        out.push(*p, c, q);
    }
    out
}

/// Per-cell building-class point counts, no-data sentinel for cells
/// fully outside the footprint (`spec.md` §4.4 step 5).
fn rasterize(
    points: &PointCollection,
    pip: &PointInPolygon,
    bbox: &Aabb2,
    cellsize: f64,
    building_class: u8,
) -> ImageMap {
    let width = ((bbox.width() / cellsize).ceil() as usize).max(1);
    let height = ((bbox.height() / cellsize).ceil() as usize).max(1);
    let mut raster = ImageMap::new("count", width, height, bbox.min, cellsize, -1.0);

    for (col, row) in raster.cells().collect::<Vec<_>>() {
        if pip.contains(raster.cell_center(col, row)) {
            raster.set(col, row, 0.0);
        }
    }
    for (p, c, _) in points.iter() {
        if c != building_class {
            continue;
        }
        if let Some((col, row)) = raster.cell_of([p.x, p.y]) {
            if !raster.is_nodata(col, row) {
                raster.set(col, row, raster.get(col, row) + 1.0);
            }
        }
    }
    raster
}

/// `spec.md` §4.4 step 8: median Z of ground points inside the
/// footprint, else inside the bbox expanded by 10 m, else `None` (C5
/// supplies a fallback).
fn ground_elevation(
    points: &PointCollection,
    footprint: &FootprintHandle,
    ground_class: u8,
) -> Option<f64> {
    let ground = points.filter_by_classification(&[ground_class]);
    if let Some(z) = ground.median_z() {
        return Some(z);
    }

    let expanded = footprint.ring.bbox().expand(10.0);
    let mut fallback = PointCollection::new();
    for (p, c, q) in points.iter() {
        if c == ground_class && expanded.contains_point([p.x, p.y]) {
            fallback.push(*p, c, q);
        }
    }
    fallback.median_z()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputIoError;
    use crate::footprint::Footprint;
    use crate::geometry::ring::LinearRing;
    use crate::source::PointCloudSource;
    use nalgebra::Point3;
    use std::sync::Arc;

    struct FixedReader {
        points: PointCollection,
    }

    impl PointCloudReader for FixedReader {
        fn read_points(
            &self,
            _location: &str,
            _bbox_min: [f64; 2],
            _bbox_max: [f64; 2],
        ) -> Result<PointCollection, InputIoError> {
            Ok(self.points.clone())
        }
    }

    fn square_footprint() -> FootprintHandle {
        let ring = LinearRing::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        Arc::new(Footprint::new("s1", ring))
    }

    fn uniform_grid_points() -> PointCollection {
        let mut pc = PointCollection::new();
        let mut x = 0.0;
        while x <= 10.0 {
            let mut y = 0.0;
            while y <= 10.0 {
                pc.push(Point3::new(x, y, 5.0), classification::BUILDING, 0);
                pc.push(Point3::new(x, y, 0.0), classification::GROUND, 0);
                y += 0.5;
            }
            x += 0.5;
        }
        pc
    }

    #[test]
    fn single_square_footprint_uniform_grid() {
        let sources: SourceIndex = Arc::new(vec![{
            let mut s = PointCloudSource::new("a", "a.csv");
            s.quality = 0;
            s.acquisition_year = 2020;
            s
        }]);
        let reader = FixedReader {
            points: uniform_grid_points(),
        };
        let footprint = square_footprint();
        let config = Config::default();

        let outcome = crop_building(&sources, &reader, &footprint, None, &config).unwrap();
        match outcome {
            CropOutcome::Cropped(crop) => {
                assert!(crop.point_density > 0.0);
                assert_eq!(crop.ground_elevation, Some(0.0));
                assert!(crop.nodata_radius >= 0.0);
            }
            CropOutcome::NoData { .. } => panic!("expected a crop, got NoData"),
        }
    }

    #[test]
    fn footprint_with_no_coverage_is_nodata() {
        let sources: SourceIndex = Arc::new(vec![PointCloudSource::new("a", "a.csv")]);
        let reader = FixedReader {
            points: PointCollection::new(),
        };
        let footprint = square_footprint();
        let config = Config::default();

        let outcome = crop_building(&sources, &reader, &footprint, None, &config).unwrap();
        assert!(matches!(outcome, CropOutcome::NoData { .. }));
    }

    #[test]
    fn crop_points_all_pass_point_in_polygon() {
        let sources: SourceIndex = Arc::new(vec![{
            let mut s = PointCloudSource::new("a", "a.csv");
            s.quality = 0;
            s
        }]);
        let reader = FixedReader {
            points: uniform_grid_points(),
        };
        let footprint = square_footprint();
        let config = Config::default();
        let outcome = crop_building(&sources, &reader, &footprint, None, &config).unwrap();
        if let CropOutcome::Cropped(crop) = outcome {
            let pip = PointInPolygon::build(&crop.footprint.ring);
            for (p, _, _) in crop.points.iter() {
                assert!(pip.contains([p.x, p.y]));
            }
        } else {
            panic!("expected a crop");
        }
    }

    #[test]
    fn large_footprint_forces_low_lod_even_with_good_density() {
        let sources: SourceIndex = Arc::new(vec![{
            let mut s = PointCloudSource::new("a", "a.csv");
            s.quality = 0;
            s
        }]);
        let reader = FixedReader {
            points: uniform_grid_points(),
        };
        let footprint = square_footprint();
        let mut config = Config::default();
        config.low_lod_area = 50; // the 10x10 square_footprint has area 100
        let outcome = crop_building(&sources, &reader, &footprint, None, &config).unwrap();
        match outcome {
            CropOutcome::Cropped(crop) => assert!(crop.force_low_lod),
            CropOutcome::NoData { .. } => panic!("expected a crop, got NoData"),
        }
    }
}
