//! Binary STL encoder
//!
//! Emits the fixed 84-byte header plus one 50-byte record per triangle.
//! Color, UV, and material data are dropped — STL cannot carry them; this
//! is the format's documented lossy path.

use glam::Vec3;
use lattice_core::{Mesh, MeshFormat, Scene};

use crate::error::EncodeError;

const HEADER_TAG: &[u8] = b"lattice binary stl export";

/// Facet normal for one triangle: the normalized average of its vertex
/// normals when the channel is present, else the winding cross product
fn facet_normal(mesh: &Mesh, face: [u32; 3]) -> Vec3 {
    let [a, b, c] = face.map(|i| i as usize);
    if let Some(normals) = &mesh.normals {
        let average = normals[a] + normals[b] + normals[c];
        if average.length_squared() > 0.0 {
            return average.normalize();
        }
    }
    let edge_ab = mesh.positions[b] - mesh.positions[a];
    let edge_ac = mesh.positions[c] - mesh.positions[a];
    edge_ab.cross(edge_ac).normalize_or_zero()
}

fn push_vec3(out: &mut Vec<u8>, v: Vec3) {
    out.extend_from_slice(&v.x.to_le_bytes());
    out.extend_from_slice(&v.y.to_le_bytes());
    out.extend_from_slice(&v.z.to_le_bytes());
}

pub fn encode_stl(scene: &Scene) -> Result<Vec<u8>, EncodeError> {
    if scene.is_empty() {
        return Err(EncodeError::EmptyScene(MeshFormat::Stl));
    }

    let triangle_count = scene.triangle_count() as u32;
    let mut out = Vec::with_capacity(84 + triangle_count as usize * 50);

    let mut header = [0u8; 80];
    header[..HEADER_TAG.len()].copy_from_slice(HEADER_TAG);
    out.extend_from_slice(&header);
    out.extend_from_slice(&triangle_count.to_le_bytes());

    for mesh in &scene.meshes {
        for &face in &mesh.faces {
            push_vec3(&mut out, facet_normal(mesh, face));
            for index in face {
                push_vec3(&mut out, mesh.positions[index as usize]);
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
    }

    Ok(out)
}
