//! A Wavefront OBJ `MeshWriter`, the reference sink named by `spec.md`
//! §6 ("CityJSON-style or equivalent"). One `<id>.obj` per building,
//! grouped by surface type, plus a `<id>.attrs.json` sidecar when
//! `attributes` isn't empty.

use lodrecon_common::error::InputIoError;
use lodrecon_common::geometry::mesh::{Mesh, SurfaceType};
use lodrecon_common::io::MeshWriter;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

pub struct ObjMeshWriter {
    out_dir: PathBuf,
}

impl ObjMeshWriter {
    pub fn new(out_dir: PathBuf) -> Self {
        ObjMeshWriter { out_dir }
    }
}

fn group_name(surface_type: SurfaceType) -> &'static str {
    match surface_type {
        SurfaceType::Floor => "floor",
        SurfaceType::Roof => "roof",
        SurfaceType::Wall => "wall",
    }
}

impl MeshWriter for ObjMeshWriter {
    fn write_mesh(&self, id: &str, mesh: &Mesh, attributes: &HashMap<String, String>) -> Result<(), InputIoError> {
        let mut body = String::new();
        for v in &mesh.vertices {
            let _ = writeln!(body, "v {} {} {}", v.x, v.y, v.z);
        }
        let mut current_group = None;
        for (face, surface_type) in mesh.faces.iter().zip(&mesh.surface_types) {
            if current_group != Some(*surface_type) {
                let _ = writeln!(body, "g {}", group_name(*surface_type));
                current_group = Some(*surface_type);
            }
            body.push('f');
            for &idx in face {
                let _ = write!(body, " {}", idx + 1);
            }
            body.push('\n');
        }

        let path = self.out_dir.join(format!("{id}.obj"));
        fs::write(&path, body).map_err(|e| InputIoError(format!("writing {}: {e}", path.display())))?;

        if !attributes.is_empty() {
            let attrs_path = self.out_dir.join(format!("{id}.attrs.json"));
            let json = serde_json::to_string_pretty(attributes)
                .map_err(|e| InputIoError(format!("serializing attributes for {id}: {e}")))?;
            fs::write(&attrs_path, json).map_err(|e| InputIoError(format!("writing {}: {e}", attrs_path.display())))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodrecon_common::geometry::mesh::Mesh;
    use nalgebra::Point3;

    #[test]
    fn writes_one_obj_file_per_building() {
        let dir = tempfile::tempdir().unwrap();
        let mut mesh = Mesh::new();
        mesh.add_face(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            SurfaceType::Floor,
        );
        let writer = ObjMeshWriter::new(dir.path().to_path_buf());
        writer.write_mesh("b1", &mesh, &HashMap::new()).unwrap();
        let contents = fs::read_to_string(dir.path().join("b1.obj")).unwrap();
        assert!(contents.contains("v 0 0 0"));
        assert!(contents.contains("g floor"));
        assert!(contents.contains("f 1 2 3 4"));
    }
}
