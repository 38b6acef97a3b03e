//! Largest inscribed empty disc (`spec.md` §4.4 step 7), a proxy for
//! occlusion inside a footprint. Grounded on the original `roofer`
//! pipeline's `NodataCircleComputer` (see `original_source/`): densify
//! the polygon boundary, then find the raster cell (among zero-count
//! cells) maximising its distance to both the nearest sample point and
//! the polygon boundary.

use crate::geometry::raster::ImageMap;
use crate::geometry::ring::LinearRing;
use crate::point_in_polygon::PointInPolygon;

pub struct NodataDisc {
    pub radius: f64,
    pub center: Option<[f64; 2]>,
}

/// `samples` are the building-class points used to compute density
/// (`spec.md` step 7: "union of sample points"). `densify_dist` is
/// `polygon_densify` from config.
pub fn largest_empty_disc(
    ring: &LinearRing,
    pip: &PointInPolygon,
    raster: &ImageMap,
    samples: &[[f64; 2]],
    densify_dist: f64,
) -> NodataDisc {
    let densified = ring.densify(densify_dist);
    let boundary: Vec<[f64; 2]> = densified.all_vertices().collect();

    let mut best_radius = 0.0;
    let mut best_center = None;

    for (col, row) in raster.cells() {
        if !raster.is_nodata(col, row) && raster.get(col, row) != 0.0 {
            continue;
        }
        let center = raster.cell_center(col, row);
        if !pip.contains(center) {
            continue;
        }
        let dist_to_sample = nearest_distance(center, samples);
        let dist_to_boundary = nearest_distance(center, &boundary);
        let radius = dist_to_sample.min(dist_to_boundary);
        if radius > best_radius {
            best_radius = radius;
            best_center = Some(center);
        }
    }

    NodataDisc {
        radius: best_radius,
        center: best_center,
    }
}

fn nearest_distance(p: [f64; 2], points: &[[f64; 2]]) -> f64 {
    points
        .iter()
        .map(|q| ((q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2)).sqrt())
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_is_zero_when_everything_covered() {
        let ring = LinearRing::new(vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]);
        let pip = PointInPolygon::build(&ring);
        let mut raster = ImageMap::new("count", 2, 2, [0.0, 0.0], 1.0, -1.0);
        raster.set(0, 0, 1.0);
        raster.set(1, 0, 1.0);
        raster.set(0, 1, 1.0);
        raster.set(1, 1, 1.0);
        let samples = vec![[0.5, 0.5], [1.5, 0.5], [0.5, 1.5], [1.5, 1.5]];
        let disc = largest_empty_disc(&ring, &pip, &raster, &samples, 0.5);
        assert_eq!(disc.radius, 0.0);
        assert!(disc.center.is_none());
    }

    #[test]
    fn disc_finds_center_of_empty_cell() {
        let ring = LinearRing::new(vec![[0.0, 0.0], [3.0, 0.0], [3.0, 3.0], [0.0, 3.0]]);
        let pip = PointInPolygon::build(&ring);
        let mut raster = ImageMap::new("count", 3, 3, [0.0, 0.0], 1.0, -1.0);
        for (col, row) in raster.cells().collect::<Vec<_>>() {
            raster.set(col, row, 1.0);
        }
        raster.set(1, 1, 0.0);
        let samples = vec![[0.5, 0.5]];
        let disc = largest_empty_disc(&ring, &pip, &raster, &samples, 0.5);
        assert!(disc.radius > 0.0);
        assert_eq!(disc.center, Some([1.5, 1.5]));
    }
}
