//! CSV-based reference `PointCloudReader`/`FootprintReader` and source
//! loading, backed by `csv` + `serde` record deserialization instead of
//! hand-rolled column splitting.

use lodrecon_common::error::InputIoError;
use lodrecon_common::footprint::Footprint;
use lodrecon_common::geometry::point::PointCollection;
use lodrecon_common::geometry::ring::LinearRing;
use lodrecon_common::io::{FootprintReader, PointCloudReader};
use lodrecon_common::source::PointCloudSource;
use nalgebra::Point3;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
    z: f64,
    classification: u8,
    quality: u8,
}

#[derive(Debug, Deserialize)]
struct SourceRecord {
    name: String,
    location: String,
    quality: i32,
    acquisition_year: i32,
    ground_class: u8,
    building_class: u8,
    force_low_lod: bool,
    select_only_for_date: bool,
}

#[derive(Debug, Deserialize)]
struct FootprintRecord {
    id: String,
    force_low_lod: bool,
    construction_year: Option<i32>,
    ring: String,
}

fn io_err(context: &str, e: impl std::fmt::Display) -> InputIoError {
    InputIoError(format!("{context}: {e}"))
}

/// Reads every point out of a source's CSV file with no bounding-box
/// pushdown; adequate for the per-building-scale files this reference
/// adapter targets.
pub struct CsvPointCloudReader {
    base_dir: PathBuf,
}

impl CsvPointCloudReader {
    pub fn new(base_dir: PathBuf) -> Self {
        CsvPointCloudReader { base_dir }
    }

    fn read_all(&self, location: &str) -> Result<PointCollection, InputIoError> {
        let path = self.base_dir.join(location);
        let mut reader =
            csv::Reader::from_path(&path).map_err(|e| io_err(&format!("opening {}", path.display()), e))?;
        let mut points = PointCollection::new();
        for record in reader.deserialize::<PointRecord>() {
            let record = record.map_err(|e| io_err(&format!("reading {}", path.display()), e))?;
            points.push(Point3::new(record.x, record.y, record.z), record.classification, record.quality);
        }
        Ok(points)
    }
}

impl PointCloudReader for CsvPointCloudReader {
    fn read_points(
        &self,
        location: &str,
        bbox_min: [f64; 2],
        bbox_max: [f64; 2],
    ) -> Result<PointCollection, InputIoError> {
        let all = self.read_all(location)?;
        let mut filtered = PointCollection::with_capacity(all.len());
        for (p, c, q) in all.iter() {
            if p.x >= bbox_min[0] && p.x <= bbox_max[0] && p.y >= bbox_min[1] && p.y <= bbox_max[1] {
                filtered.push(*p, c, q);
            }
        }
        Ok(filtered)
    }
}

pub struct CsvFootprintReader {
    path: PathBuf,
}

impl CsvFootprintReader {
    pub fn new(path: PathBuf) -> Self {
        CsvFootprintReader { path }
    }
}

impl FootprintReader for CsvFootprintReader {
    fn read_footprints(&self) -> Result<Vec<Footprint>, InputIoError> {
        read_footprints(&self.path)
    }
}

/// Parses a `ring` column formatted as `"x1 y1;x2 y2;..."`. Holes aren't
/// representable by this reference format; a `FootprintReader` backed by
/// a richer vector format can still produce them directly.
fn parse_ring(raw: &str) -> Result<LinearRing, InputIoError> {
    let mut points = Vec::new();
    for pair in raw.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let mut coords = pair.split_whitespace();
        let malformed = || InputIoError(format!("malformed ring vertex `{pair}`"));
        let x: f64 = coords.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
        let y: f64 = coords.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
        points.push([x, y]);
    }
    if points.len() < 3 {
        return Err(InputIoError(format!("ring `{raw}` has fewer than 3 vertices")));
    }
    Ok(LinearRing::new(points))
}

pub fn read_footprints(path: &Path) -> Result<Vec<Footprint>, InputIoError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| io_err(&format!("opening {}", path.display()), e))?;
    let mut out = Vec::new();
    for record in reader.deserialize::<FootprintRecord>() {
        let record = record.map_err(|e| io_err(&format!("reading {}", path.display()), e))?;
        let ring = parse_ring(&record.ring)?;
        let mut footprint = Footprint::new(record.id, ring);
        footprint.force_low_lod = record.force_low_lod;
        footprint.construction_year = record.construction_year;
        out.push(footprint);
    }
    Ok(out)
}

pub fn read_sources(path: &Path) -> Result<Vec<PointCloudSource>, InputIoError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| io_err(&format!("opening {}", path.display()), e))?;
    let mut out = Vec::new();
    for record in reader.deserialize::<SourceRecord>() {
        let record = record.map_err(|e| io_err(&format!("reading {}", path.display()), e))?;
        out.push(PointCloudSource {
            name: record.name,
            location: record.location,
            quality: record.quality,
            acquisition_year: record.acquisition_year,
            ground_class: record.ground_class,
            building_class: record.building_class,
            force_low_lod: record.force_low_lod,
            select_only_for_date: record.select_only_for_date,
        });
    }
    Ok(out)
}

/// Every ground-classified point across every listed source, for seeding
/// an `ElevationProvider::interpolated`.
pub fn collect_ground_samples(sources: &[PointCloudSource], base_dir: &Path) -> Vec<(f64, f64, f64)> {
    let reader = CsvPointCloudReader::new(base_dir.to_path_buf());
    let mut samples = Vec::new();
    for source in sources {
        let Ok(points) = reader.read_all(&source.location) else {
            continue;
        };
        for (p, c, _) in points.iter() {
            if c == source.ground_class {
                samples.push((p.x, p.y, p.z));
            }
        }
    }
    samples
}
