use crate::geometry::plane::Plane;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// Per-face surface type tag, `spec.md` §3 ("a mapping from an integer
/// surface-type tag (ground / roof / wall)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    Floor = 0,
    Roof = 1,
    Wall = 2,
}

impl SurfaceType {
    pub fn tag(self) -> i32 {
        self as i32
    }
}

/// An indexed vertex/face mesh with a per-face surface-type tag
/// (`spec.md` §4.1). Faces are stored as polygons (not pre-triangulated)
/// since the validator and the mesh writer both operate on planar faces.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<Vec<usize>>,
    pub surface_types: Vec<SurfaceType>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a closed planar face built from `verts`, appending new
    /// vertices to the shared vertex store. Returns the face index.
    pub fn add_face(&mut self, verts: &[Point3<f64>], surface_type: SurfaceType) -> usize {
        let indices: Vec<usize> = verts
            .iter()
            .map(|v| {
                // Coordinates come from exact arithmetic on the same
                // extrusion elevations, so reusing a matching vertex
                // where one already exists keeps faces watertight
                // without introducing a full spatial hash.
                if let Some(i) = self
                    .vertices
                    .iter()
                    .position(|existing| (existing - v).norm() < 1e-9)
                {
                    i
                } else {
                    self.vertices.push(*v);
                    self.vertices.len() - 1
                }
            })
            .collect();
        self.faces.push(indices);
        self.surface_types.push(surface_type);
        self.faces.len() - 1
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn faces_for_surface_type(
        &self,
        surface_type: SurfaceType,
    ) -> impl Iterator<Item = (usize, &[usize])> {
        self.faces
            .iter()
            .enumerate()
            .zip(self.surface_types.iter())
            .filter(move |(_, st)| **st == surface_type)
            .map(|((i, f), _)| (i, f.as_slice()))
    }

    pub fn face_vertices(&self, face_idx: usize) -> Vec<Point3<f64>> {
        self.faces[face_idx]
            .iter()
            .map(|&i| self.vertices[i])
            .collect()
    }

    /// Newell's method normal, robust for faces that aren't perfectly
    /// planar (used by the validator to check deviation, not to assume
    /// planarity).
    pub fn face_normal(&self, face_idx: usize) -> Vector3<f64> {
        let verts = self.face_vertices(face_idx);
        let mut normal = Vector3::zeros();
        let n = verts.len();
        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        if normal.norm() > 1e-12 {
            normal.normalize()
        } else {
            normal
        }
    }

    pub fn face_plane(&self, face_idx: usize) -> Option<Plane> {
        Plane::fit(&self.face_vertices(face_idx))
    }

    /// Unordered edges of a face, vertex indices into `self.vertices`.
    pub fn face_edges(&self, face_idx: usize) -> Vec<(usize, usize)> {
        let f = &self.faces[face_idx];
        let n = f.len();
        (0..n)
            .map(|i| {
                let a = f[i];
                let b = f[(i + 1) % n];
                if a < b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect()
    }

    /// Maps each undirected edge to the faces that reference it, used by
    /// the validator's closedness check (`spec.md` §4.7 (ii)).
    pub fn edge_face_map(&self) -> HashMap<(usize, usize), Vec<usize>> {
        let mut map: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for face_idx in 0..self.faces.len() {
            for edge in self.face_edges(face_idx) {
                map.entry(edge).or_default().push(face_idx);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_face_shares_vertices() {
        let mut mesh = Mesh::new();
        let floor = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        mesh.add_face(&floor, SurfaceType::Floor);
        let wall = vec![floor[0], floor[1], floor[1] + Vector3::new(0.0, 0.0, 1.0)];
        mesh.add_face(&wall, SurfaceType::Wall);
        // floor[0] and floor[1] should be reused, not duplicated.
        assert_eq!(mesh.vertex_count(), 5);
    }

    #[test]
    fn edge_face_map_counts_shared_edges() {
        let mut mesh = Mesh::new();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(1.0, 1.0, 0.0);
        let d = Point3::new(0.0, 1.0, 0.0);
        mesh.add_face(&[a, b, c], SurfaceType::Roof);
        mesh.add_face(&[a, c, d], SurfaceType::Roof);
        let map = mesh.edge_face_map();
        let shared = map
            .values()
            .filter(|faces| faces.len() == 2)
            .count();
        assert_eq!(shared, 1);
    }
}
