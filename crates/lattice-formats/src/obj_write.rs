//! Wavefront OBJ encoder
//!
//! Emits v/vt/vn/f records with 1-based indices in declaration order. Each
//! mesh becomes one `o` object; indices are global across the file as the
//! format requires. Vertex colors cannot be represented and are dropped.

use std::fmt::Write;

use lattice_core::{MeshFormat, Scene};

use crate::error::EncodeError;

pub fn encode_obj(scene: &Scene) -> Result<Vec<u8>, EncodeError> {
    if scene.is_empty() {
        return Err(EncodeError::EmptyScene(MeshFormat::Obj));
    }

    let mut out = String::new();
    let mut v_base: u32 = 1;
    let mut vt_base: u32 = 1;
    let mut vn_base: u32 = 1;

    for mesh in &scene.meshes {
        if mesh.positions.is_empty() {
            continue;
        }
        let _ = writeln!(out, "o {}", mesh.name);

        for p in &mesh.positions {
            let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
        }
        if let Some(uvs) = &mesh.uvs {
            for t in uvs {
                let _ = writeln!(out, "vt {} {}", t.x, t.y);
            }
        }
        if let Some(normals) = &mesh.normals {
            for n in normals {
                let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
            }
        }

        let has_uv = mesh.uvs.is_some();
        let has_normal = mesh.normals.is_some();
        for face in &mesh.faces {
            out.push('f');
            for &index in face {
                let v = v_base + index;
                match (has_uv, has_normal) {
                    (false, false) => {
                        let _ = write!(out, " {v}");
                    }
                    (true, false) => {
                        let _ = write!(out, " {v}/{}", vt_base + index);
                    }
                    (false, true) => {
                        let _ = write!(out, " {v}//{}", vn_base + index);
                    }
                    (true, true) => {
                        let _ = write!(out, " {v}/{}/{}", vt_base + index, vn_base + index);
                    }
                }
            }
            out.push('\n');
        }

        v_base += mesh.positions.len() as u32;
        if let Some(uvs) = &mesh.uvs {
            vt_base += uvs.len() as u32;
        }
        if let Some(normals) = &mesh.normals {
            vn_base += normals.len() as u32;
        }
    }

    Ok(out.into_bytes())
}
