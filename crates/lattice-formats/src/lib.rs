//! Lattice Formats - Mesh format decoders and encoders
//!
//! Decodes OBJ, STL, PLY, and glTF/GLB byte buffers into the canonical
//! scene and serializes canonical scenes back out, applying each target
//! format's capability truncation (color, UV, and material data are
//! dropped where a format cannot carry them). Dispatch is a closed match
//! over `MeshFormat` so a missing codec is a compile error.

mod error;
mod gltf_read;
mod gltf_write;
mod obj_read;
mod obj_write;
mod ply_read;
mod ply_write;
mod stl_read;
mod stl_write;

pub use error::{DecodeError, EncodeError};

use lattice_core::{MeshFormat, Scene};
use tracing::debug;

/// Decode format-specific bytes into a canonical scene
pub fn decode(bytes: &[u8], format: MeshFormat) -> Result<Scene, DecodeError> {
    let scene = match format {
        MeshFormat::Obj => obj_read::decode_obj(bytes)?,
        MeshFormat::Stl => stl_read::decode_stl(bytes)?,
        MeshFormat::Ply => ply_read::decode_ply(bytes)?,
        MeshFormat::Gltf | MeshFormat::Glb => gltf_read::decode_gltf(bytes)?,
    };
    debug!(
        %format,
        meshes = scene.meshes.len(),
        vertices = scene.vertex_count(),
        triangles = scene.triangle_count(),
        "decoded scene"
    );
    Ok(scene)
}

/// Serialize a canonical scene into the target format
pub fn encode(scene: &Scene, format: MeshFormat) -> Result<Vec<u8>, EncodeError> {
    let bytes = match format {
        MeshFormat::Obj => obj_write::encode_obj(scene)?,
        MeshFormat::Stl => stl_write::encode_stl(scene)?,
        MeshFormat::Ply => ply_write::encode_ply(scene)?,
        MeshFormat::Gltf => gltf_write::encode_gltf(scene)?,
        MeshFormat::Glb => gltf_write::encode_glb(scene)?,
    };
    debug!(%format, len = bytes.len(), "encoded scene");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lattice_core::Mesh;

    fn triangle_scene() -> Scene {
        let mut mesh = Mesh::new("tri");
        mesh.positions = vec![
            Vec3::new(0.25, -1.5, 3.0),
            Vec3::new(2.75, 0.5, -0.25),
            Vec3::new(-0.5, 4.25, 1.0),
        ];
        mesh.faces = vec![[0, 1, 2]];
        Scene { meshes: vec![mesh] }
    }

    #[test]
    fn every_format_encodes_a_triangle() {
        let scene = triangle_scene();
        for format in MeshFormat::ALL {
            let bytes = encode(&scene, format).unwrap();
            assert!(!bytes.is_empty(), "{format} produced no bytes");
        }
    }

    #[test]
    fn every_format_round_trips_positions_and_topology() {
        let scene = triangle_scene();
        for format in MeshFormat::ALL {
            let bytes = encode(&scene, format).unwrap();
            let decoded = decode(&bytes, format).unwrap();
            assert_eq!(decoded.triangle_count(), 1, "{format} lost topology");
            assert_eq!(decoded.vertex_count(), 3, "{format} changed vertex count");

            // Decoders keep face-corner order, so positions line up by
            // walking the faces of both scenes.
            let original = &scene.meshes[0];
            let round_tripped = &decoded.meshes[0];
            for (a, b) in original.faces.iter().zip(&round_tripped.faces) {
                for (&ia, &ib) in a.iter().zip(b) {
                    let pa = original.positions[ia as usize];
                    let pb = round_tripped.positions[ib as usize];
                    assert!(
                        (pa - pb).length() < 1e-4,
                        "{format} moved a vertex: {pa} vs {pb}"
                    );
                }
            }
        }
    }

    #[test]
    fn shared_edge_stl_reencodes_to_obj_without_dedup() {
        // Binary STL: two triangles sharing the (0,0,0)-(1,1,0) edge.
        let mut stl = vec![0u8; 80];
        stl.extend_from_slice(&2u32.to_le_bytes());
        let facets: [[[f32; 3]; 4]; 2] = [
            [
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            [
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
        ];
        for facet in facets {
            for vector in facet {
                for component in vector {
                    stl.extend_from_slice(&component.to_le_bytes());
                }
            }
            stl.extend_from_slice(&0u16.to_le_bytes());
        }

        let scene = decode(&stl, MeshFormat::Stl).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.vertex_count(), 6);
        assert_eq!(scene.triangle_count(), 2);

        let obj = String::from_utf8(encode(&scene, MeshFormat::Obj).unwrap()).unwrap();
        let v_lines = obj.lines().filter(|l| l.starts_with("v ")).count();
        let f_lines = obj.lines().filter(|l| l.starts_with("f ")).count();
        assert_eq!(v_lines, 6);
        assert_eq!(f_lines, 2);
    }
}
