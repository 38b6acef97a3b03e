//! The mesh validator (`spec.md` §4.7, C7): planarity, closedness,
//! self-intersection, and orientation checks. Read-only — "does not
//! mutate the mesh".

use crate::error::ValidationError;
use crate::geometry::mesh::Mesh;
use crate::model::BuildingResult;

pub fn validate_mesh(
    footprint_id: &str,
    mesh: &Mesh,
    tol_planarity_d2p: f64,
    tol_planarity_normals_deg: f64,
) -> BuildingResult {
    let mut errors = Vec::new();

    check_planarity(mesh, tol_planarity_d2p, tol_planarity_normals_deg, &mut errors);
    check_closedness(mesh, &mut errors);
    check_self_intersection(mesh, &mut errors);
    check_orientation(mesh, &mut errors);

    BuildingResult {
        footprint_id: footprint_id.to_string(),
        mesh: mesh.clone(),
        errors,
    }
}

fn check_planarity(mesh: &Mesh, tol_d2p: f64, tol_normals_deg: f64, errors: &mut Vec<ValidationError>) {
    for face_idx in 0..mesh.face_count() {
        let verts = mesh.face_vertices(face_idx);
        let plane = match mesh.face_plane(face_idx) {
            Some(p) => p,
            None => continue,
        };
        let max_dist = verts
            .iter()
            .map(|v| plane.signed_distance(*v).abs())
            .fold(0.0_f64, f64::max);

        let newell = mesh.face_normal(face_idx);
        let angle = newell.dot(&plane.normal).clamp(-1.0, 1.0).abs().acos().to_degrees();

        if max_dist > tol_d2p || angle > tol_normals_deg {
            errors.push(ValidationError::NonPlanarFace {
                face: face_idx,
                distance: max_dist,
            });
        }
    }
}

fn check_closedness(mesh: &Mesh, errors: &mut Vec<ValidationError>) {
    for (edge, faces) in mesh.edge_face_map() {
        if faces.len() != 2 {
            errors.push(ValidationError::NotClosed(edge, faces.len()));
        }
    }
}

fn check_self_intersection(mesh: &Mesh, errors: &mut Vec<ValidationError>) {
    for face_idx in 0..mesh.face_count() {
        let verts = mesh.face_vertices(face_idx);
        if verts.len() < 4 {
            continue;
        }
        let plane = match mesh.face_plane(face_idx) {
            Some(p) => p,
            None => continue,
        };
        let projected = project_to_2d(&verts, &plane);
        if polygon_self_intersects(&projected) {
            errors.push(ValidationError::SelfIntersection(face_idx));
        }
    }
}

fn check_orientation(mesh: &Mesh, errors: &mut Vec<ValidationError>) {
    if mesh.vertex_count() == 0 {
        return;
    }
    let sum = mesh
        .vertices
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.coords);
    let centroid = nalgebra::Point3::from(sum / mesh.vertex_count() as f64);

    for face_idx in 0..mesh.face_count() {
        let verts = mesh.face_vertices(face_idx);
        let face_sum = verts
            .iter()
            .fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.coords);
        let face_centroid = nalgebra::Point3::from(face_sum / verts.len() as f64);
        let outward = face_centroid - centroid;
        let normal = mesh.face_normal(face_idx);
        if normal.norm() < 1e-9 {
            continue;
        }
        if normal.dot(&outward) < -1e-9 {
            errors.push(ValidationError::BadOrientation(face_idx));
        }
    }
}

fn project_to_2d(verts: &[nalgebra::Point3<f64>], plane: &crate::geometry::plane::Plane) -> Vec<[f64; 2]> {
    let n = plane.normal;
    let u = if n.x.abs() < 0.9 {
        n.cross(&nalgebra::Vector3::x()).normalize()
    } else {
        n.cross(&nalgebra::Vector3::y()).normalize()
    };
    let v = n.cross(&u);
    verts
        .iter()
        .map(|p| {
            let rel = p.coords;
            [rel.dot(&u), rel.dot(&v)]
        })
        .collect()
}

fn polygon_self_intersects(ring: &[[f64; 2]]) -> bool {
    let n = ring.len();
    for i in 0..n {
        let (a1, a2) = (ring[i], ring[(i + 1) % n]);
        for j in (i + 1)..n {
            if j == i || (j + 1) % n == i || j == (i + 1) % n {
                continue;
            }
            let (b1, b2) = (ring[j], ring[(j + 1) % n]);
            if segments_properly_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

fn segments_properly_intersect(p1: [f64; 2], p2: [f64; 2], p3: [f64; 2], p4: [f64; 2]) -> bool {
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);
    ((d1 > 0.0) != (d2 > 0.0)) && ((d3 > 0.0) != (d4 > 0.0))
}

fn cross(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::SurfaceType;
    use crate::reconstruct::extrude::low_lod_mesh;

    #[test]
    fn low_lod_box_is_closed_and_valid() {
        let outer = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let mesh = low_lod_mesh(&outer, 0.0, 5.0);
        let result = validate_mesh("b1", &mesh, 0.01, 20.0);
        assert!(result.is_valid(), "errors: {:?}", result.errors);
    }

    #[test]
    fn self_intersecting_quad_is_flagged() {
        use nalgebra::Point3;
        let mut mesh = Mesh::new();
        let verts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        mesh.add_face(&verts, SurfaceType::Floor);
        let result = validate_mesh("b1", &mesh, 0.01, 20.0);
        assert!(!result.is_valid());
    }
}
