//! Polygon assembly and extrusion (`spec.md` §4.6 steps 4–5, and the
//! Path A low-detail extrusion). Connected same-label arrangement faces
//! are merged into a polygon by square-tracing their grid boundary (the
//! counterpart of a true arrangement-face merge, see `arrangement.rs`),
//! then extruded from the labelled plane's roof surface down to
//! `ground_elevation`.

use crate::geometry::mesh::{Mesh, SurfaceType};
use crate::geometry::plane::Plane;
use crate::geometry::ring::LinearRing;
use crate::reconstruct::arrangement::Arrangement;
use crate::reconstruct::planes::PlaneCluster;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};

/// Signed shoelace area; positive for a counter-clockwise ring.
fn signed_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a[0] * b[1] - b[0] * a[1];
    }
    sum / 2.0
}

fn oriented(ring: &[[f64; 2]], ccw: bool) -> Vec<[f64; 2]> {
    let is_ccw = signed_area(ring) > 0.0;
    if is_ccw == ccw {
        ring.to_vec()
    } else {
        ring.iter().rev().copied().collect()
    }
}

fn add_extruded_polygon(mesh: &mut Mesh, ring2d: &[[f64; 2]], floor_z: f64, roof_z_at: impl Fn(f64, f64) -> f64) {
    let ccw = oriented(ring2d, true);
    let cw = oriented(ring2d, false);

    let roof: Vec<Point3<f64>> = ccw.iter().map(|p| Point3::new(p[0], p[1], roof_z_at(p[0], p[1]))).collect();
    let floor: Vec<Point3<f64>> = cw.iter().map(|p| Point3::new(p[0], p[1], floor_z)).collect();
    mesh.add_face(&roof, SurfaceType::Roof);
    mesh.add_face(&floor, SurfaceType::Floor);

    let n = ccw.len();
    for i in 0..n {
        let a = ccw[i];
        let b = ccw[(i + 1) % n];
        let wall = vec![
            Point3::new(a[0], a[1], floor_z),
            Point3::new(b[0], b[1], floor_z),
            Point3::new(b[0], b[1], roof_z_at(b[0], b[1])),
            Point3::new(a[0], a[1], roof_z_at(a[0], a[1])),
        ];
        mesh.add_face(&wall, SurfaceType::Wall);
    }
}

/// Path A: one flat roof over the whole footprint (`spec.md` §4.6 Path A).
pub fn low_lod_mesh(footprint_outer: &[[f64; 2]], floor_z: f64, roof_z: f64) -> Mesh {
    let mut mesh = Mesh::new();
    add_extruded_polygon(&mut mesh, footprint_outer, floor_z, |_, _| roof_z);
    mesh
}

/// Path B steps 4–5: merges same-label faces, drops small polygons, and
/// extrudes each surviving one against its plane.
pub fn assemble_and_extrude(
    arrangement: &Arrangement,
    labels: &[Option<usize>],
    planes: &[PlaneCluster],
    ground_elevation: f64,
    min_polygon_area: f64,
) -> Mesh {
    let mut mesh = Mesh::new();
    let mut visited = vec![false; arrangement.faces.len()];

    for start in 0..arrangement.faces.len() {
        let label = match labels[start] {
            Some(l) => l,
            None => continue,
        };
        if visited[start] {
            continue;
        }

        let mut component = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(idx) = stack.pop() {
            component.push(idx);
            for n in arrangement.neighbors(idx) {
                if !visited[n] && labels[n] == Some(label) {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }

        let cells: HashSet<(i64, i64)> = component
            .iter()
            .map(|&i| {
                let f = &arrangement.faces[i];
                (f.col as i64, f.row as i64)
            })
            .collect();

        let ring = match trace_outer_boundary(&cells, arrangement.origin, arrangement.cellsize) {
            Some(r) => r,
            None => continue,
        };
        if LinearRing::new(ring.clone()).area() < min_polygon_area as f64 {
            continue;
        }

        let plane: &Plane = &planes[label].plane;
        add_extruded_polygon(&mut mesh, &ring, ground_elevation, |x, y| plane.z_at(x, y));
    }

    mesh
}

/// Square-tracing of a connected cell set's boundary into a single
/// world-space ring. When the region has more than one boundary loop
/// (an internal hole, or a pinch point), only the largest loop by area
/// is kept — this crate's arrangement faces are grid cells, not exact
/// polygons, so interior holes are not expected in practice.
fn trace_outer_boundary(
    cells: &HashSet<(i64, i64)>,
    origin: [f64; 2],
    cellsize: f64,
) -> Option<Vec<[f64; 2]>> {
    let mut directed: HashMap<(i64, i64), (i64, i64)> = HashMap::new();
    for &(c, r) in cells {
        if !cells.contains(&(c, r - 1)) {
            directed.insert((c, r), (c + 1, r));
        }
        if !cells.contains(&(c + 1, r)) {
            directed.insert((c + 1, r), (c + 1, r + 1));
        }
        if !cells.contains(&(c, r + 1)) {
            directed.insert((c + 1, r + 1), (c, r + 1));
        }
        if !cells.contains(&(c - 1, r)) {
            directed.insert((c, r + 1), (c, r));
        }
    }

    let mut visited = HashSet::new();
    let mut best: Option<Vec<(i64, i64)>> = None;
    let starts: Vec<(i64, i64)> = directed.keys().copied().collect();
    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let mut loop_pts = vec![start];
        visited.insert(start);
        let mut cur = start;
        loop {
            let next = match directed.get(&cur) {
                Some(&n) => n,
                None => break,
            };
            if next == start {
                break;
            }
            loop_pts.push(next);
            visited.insert(next);
            cur = next;
        }
        let better = best
            .as_ref()
            .map(|b| loop_pts.len() > b.len())
            .unwrap_or(true);
        if better {
            best = Some(loop_pts);
        }
    }

    best.map(|corners| {
        corners
            .into_iter()
            .map(|(c, r)| [origin[0] + c as f64 * cellsize, origin[1] + r as f64 * cellsize])
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_lod_extrusion_produces_expected_face_counts() {
        let outer = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let mesh = low_lod_mesh(&outer, 0.0, 5.0);
        assert_eq!(mesh.faces_for_surface_type(SurfaceType::Roof).count(), 1);
        assert_eq!(mesh.faces_for_surface_type(SurfaceType::Floor).count(), 1);
        assert_eq!(mesh.faces_for_surface_type(SurfaceType::Wall).count(), 4);
    }

    #[test]
    fn low_lod_roof_is_flat_at_requested_z() {
        let outer = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let mesh = low_lod_mesh(&outer, 0.0, 5.0);
        let (face_idx, _) = mesh.faces_for_surface_type(SurfaceType::Roof).next().unwrap();
        for v in mesh.face_vertices(face_idx) {
            assert_eq!(v.z, 5.0);
        }
    }

    #[test]
    fn trace_single_cell_region() {
        let mut cells = HashSet::new();
        cells.insert((0i64, 0i64));
        let ring = trace_outer_boundary(&cells, [0.0, 0.0], 1.0).unwrap();
        assert_eq!(ring.len(), 4);
        assert!(LinearRing::new(ring).area() > 0.99);
    }

    #[test]
    fn trace_2x2_region_merges_into_one_square() {
        let mut cells = HashSet::new();
        for c in 0..2 {
            for r in 0..2 {
                cells.insert((c, r));
            }
        }
        let ring = trace_outer_boundary(&cells, [0.0, 0.0], 1.0).unwrap();
        assert!((LinearRing::new(ring).area() - 4.0).abs() < 1e-9);
    }
}
