//! The 2D arrangement of `spec.md` §4.6 step 2, realized as a regular
//! grid decomposition rather than an exact line-segment arrangement: a
//! full planar sweep over arbitrary polygon boundaries is out of the
//! scope this exercise budgets for the reconstructor (see `DESIGN.md`).
//! The grid still gives every face a flat index (`spec.md` §9:
//! "arena-indexed representation... faces... in flat stores") and a
//! grid-adjacency notion of "shared edge" for the pairwise labeling term.

use crate::geometry::bounding_box::Aabb2;
use crate::geometry::point::percentile;
use crate::point_in_polygon::PointInPolygon;
use crate::reconstruct::planes::PlaneCluster;
use nalgebra::Point3;

#[derive(Debug, Clone)]
pub struct Face {
    pub col: usize,
    pub row: usize,
    pub center: [f64; 2],
    pub inside_footprint: bool,
    pub elevation_p50: Option<f64>,
    pub elevation_p70: Option<f64>,
    pub elevation_p97: Option<f64>,
    /// RMS fit error to each candidate plane, aligned with the plane
    /// list passed to [`Arrangement::build`]; empty when the face has no
    /// supporting points (treated as "no evidence" by labeling).
    pub rms_by_plane: Vec<f64>,
    pub pixel_count: usize,
}

pub struct Arrangement {
    pub faces: Vec<Face>,
    pub width: usize,
    pub height: usize,
    pub cellsize: f64,
    pub origin: [f64; 2],
}

impl Arrangement {
    pub fn index_of(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// Flat-indexed neighbours sharing a grid edge with `face_idx`.
    pub fn neighbors(&self, face_idx: usize) -> Vec<usize> {
        let f = &self.faces[face_idx];
        let mut out = Vec::with_capacity(4);
        let (col, row) = (f.col, f.row);
        if col > 0 {
            out.push(self.index_of(col - 1, row));
        }
        if col + 1 < self.width {
            out.push(self.index_of(col + 1, row));
        }
        if row > 0 {
            out.push(self.index_of(col, row - 1));
        }
        if row + 1 < self.height {
            out.push(self.index_of(col, row + 1));
        }
        out
    }
}

/// Builds the grid arrangement over `bbox` at `cellsize`, evaluating
/// each cell's fit against every plane in `planes` from the roof points
/// (`all_points`) that fall into it.
pub fn build(
    bbox: &Aabb2,
    cellsize: f64,
    pip: &PointInPolygon,
    planes: &[PlaneCluster],
    all_points: &[Point3<f64>],
) -> Result<Arrangement, String> {
    if cellsize <= 0.0 {
        return Err("cellsize must be positive".to_string());
    }
    let width = ((bbox.width() / cellsize).ceil() as usize).max(1);
    let height = ((bbox.height() / cellsize).ceil() as usize).max(1);
    if width.saturating_mul(height) == 0 {
        return Err("degenerate arrangement extent".to_string());
    }

    let mut cell_points: Vec<Vec<Point3<f64>>> = vec![Vec::new(); width * height];
    for p in all_points {
        let fx = (p.x - bbox.min[0]) / cellsize;
        let fy = (p.y - bbox.min[1]) / cellsize;
        if fx < 0.0 || fy < 0.0 {
            continue;
        }
        let (col, row) = (fx as usize, fy as usize);
        if col < width && row < height {
            cell_points[row * width + col].push(*p);
        }
    }

    let mut faces = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let center = [
                bbox.min[0] + (col as f64 + 0.5) * cellsize,
                bbox.min[1] + (row as f64 + 0.5) * cellsize,
            ];
            let points = &cell_points[row * width + col];
            let (p50, p70, p97) = if points.is_empty() {
                (None, None, None)
            } else {
                let mut zs: Vec<f64> = points.iter().map(|p| p.z).collect();
                (
                    Some(percentile(&mut zs.clone(), 0.5)),
                    Some(percentile(&mut zs.clone(), 0.7)),
                    Some(percentile(&mut zs, 0.97)),
                )
            };
            let rms_by_plane = if points.is_empty() {
                Vec::new()
            } else {
                planes
                    .iter()
                    .map(|pc| pc.plane.rms_error(points))
                    .collect()
            };
            faces.push(Face {
                col,
                row,
                center,
                inside_footprint: pip.contains(center),
                elevation_p50: p50,
                elevation_p70: p70,
                elevation_p97: p97,
                rms_by_plane,
                pixel_count: points.len(),
            });
        }
    }

    Ok(Arrangement {
        faces,
        width,
        height,
        cellsize,
        origin: bbox.min,
    })
}
