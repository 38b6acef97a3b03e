//! The external-collaborator boundary (`spec.md` §6, §9): closed-variant
//! sum types inside the core, `dyn`-safe capability traits only at this
//! boundary, so format-specific I/O code never leaks past it. Concrete
//! implementations (CSV, LAS, GeoPackage, ...) live outside this crate;
//! `lodrecon-cli::adapters` wires reference CSV-based ones.

use crate::error::InputIoError;
use crate::footprint::Footprint;
use crate::geometry::mesh::Mesh;
use crate::geometry::point::PointCollection;
use crate::geometry::raster::ImageMap;
use std::collections::HashMap;

/// Given a storage handle and a 2D bounding box, yields the points
/// falling inside it (`spec.md` §6). Implementations are required to be
/// internally thread-safe, or pooled one-per-worker (`spec.md` §5).
pub trait PointCloudReader: Send + Sync {
    fn read_points(
        &self,
        location: &str,
        bbox_min: [f64; 2],
        bbox_max: [f64; 2],
    ) -> Result<PointCollection, InputIoError>;
}

/// Yields the footprint set consumed by the batch scheduler (`spec.md`
/// §6).
pub trait FootprintReader: Send + Sync {
    fn read_footprints(&self) -> Result<Vec<Footprint>, InputIoError>;
}

/// `write_mesh(id, mesh, attributes)`, CityJSON-style or equivalent
/// (`spec.md` §6).
pub trait MeshWriter: Send + Sync {
    fn write_mesh(
        &self,
        id: &str,
        mesh: &Mesh,
        attributes: &HashMap<String, String>,
    ) -> Result<(), InputIoError>;
}

/// `writeBands(path, bands)` (`spec.md` §6).
pub trait RasterWriter: Send + Sync {
    fn write_bands(&self, path: &str, bands: &[ImageMap]) -> Result<(), InputIoError>;
}

/// `write_pointcloud(pointcloud, path)` (`spec.md` §6).
pub trait LasWriter: Send + Sync {
    fn write_pointcloud(&self, points: &PointCollection, path: &str) -> Result<(), InputIoError>;
}

/// A spatial reference identifier (`spec.md` §6). This system does not
/// reproject; it only carries and reports the identifier, per `spec.md`
/// §1 ("coordinate-system (EPSG/WKT) handling" is out of scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpatialReferenceSystem {
    Epsg(u32),
    Wkt(String),
}

impl SpatialReferenceSystem {
    pub fn is_valid(&self) -> bool {
        match self {
            SpatialReferenceSystem::Epsg(code) => *code > 0,
            SpatialReferenceSystem::Wkt(wkt) => !wkt.trim().is_empty(),
        }
    }

    pub fn export_wkt(&self) -> Option<&str> {
        match self {
            SpatialReferenceSystem::Wkt(wkt) => Some(wkt),
            SpatialReferenceSystem::Epsg(_) => None,
        }
    }

    pub fn get_auth_name(&self) -> &'static str {
        "EPSG"
    }

    pub fn get_auth_code(&self) -> Option<u32> {
        match self {
            SpatialReferenceSystem::Epsg(code) => Some(*code),
            SpatialReferenceSystem::Wkt(_) => None,
        }
    }
}
