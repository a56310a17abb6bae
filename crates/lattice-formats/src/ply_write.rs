//! ASCII PLY encoder
//!
//! The header declares exactly the properties emitted per vertex line, in
//! the same order. Color is preserved when any source mesh carries it;
//! meshes without the channel fall back to their material's base color.

use std::fmt::Write;

use lattice_core::{Color, MeshFormat, Scene};

use crate::error::EncodeError;

pub fn encode_ply(scene: &Scene) -> Result<Vec<u8>, EncodeError> {
    if scene.is_empty() {
        return Err(EncodeError::EmptyScene(MeshFormat::Ply));
    }

    let any_normals = scene.meshes.iter().any(|m| m.normals.is_some());
    let any_uvs = scene.meshes.iter().any(|m| m.uvs.is_some());
    let any_colors = scene.meshes.iter().any(|m| m.colors.is_some());

    let mut out = String::new();
    let _ = writeln!(out, "ply");
    let _ = writeln!(out, "format ascii 1.0");
    let _ = writeln!(out, "comment exported by lattice");
    let _ = writeln!(out, "element vertex {}", scene.vertex_count());
    let _ = writeln!(out, "property float x");
    let _ = writeln!(out, "property float y");
    let _ = writeln!(out, "property float z");
    if any_normals {
        let _ = writeln!(out, "property float nx");
        let _ = writeln!(out, "property float ny");
        let _ = writeln!(out, "property float nz");
    }
    if any_uvs {
        let _ = writeln!(out, "property float s");
        let _ = writeln!(out, "property float t");
    }
    if any_colors {
        let _ = writeln!(out, "property uchar red");
        let _ = writeln!(out, "property uchar green");
        let _ = writeln!(out, "property uchar blue");
    }
    let _ = writeln!(out, "element face {}", scene.triangle_count());
    let _ = writeln!(out, "property list uchar int vertex_indices");
    let _ = writeln!(out, "end_header");

    for mesh in &scene.meshes {
        let fallback_color = mesh
            .material
            .map(|m| m.base_color)
            .unwrap_or(Color::WHITE);
        for (i, position) in mesh.positions.iter().enumerate() {
            let _ = write!(out, "{} {} {}", position.x, position.y, position.z);
            if any_normals {
                let normal = mesh
                    .normals
                    .as_ref()
                    .map(|n| n[i])
                    .unwrap_or(glam::Vec3::ZERO);
                let _ = write!(out, " {} {} {}", normal.x, normal.y, normal.z);
            }
            if any_uvs {
                let uv = mesh.uvs.as_ref().map(|u| u[i]).unwrap_or(glam::Vec2::ZERO);
                let _ = write!(out, " {} {}", uv.x, uv.y);
            }
            if any_colors {
                let [r, g, b] = mesh
                    .colors
                    .as_ref()
                    .map(|c| c[i])
                    .unwrap_or(fallback_color)
                    .to_u8();
                let _ = write!(out, " {r} {g} {b}");
            }
            out.push('\n');
        }
    }

    let mut base: u32 = 0;
    for mesh in &scene.meshes {
        for face in &mesh.faces {
            let _ = writeln!(
                out,
                "3 {} {} {}",
                base + face[0],
                base + face[1],
                base + face[2]
            );
        }
        base += mesh.positions.len() as u32;
    }

    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lattice_core::Mesh;

    fn triangle(colors: bool) -> Mesh {
        let mut mesh = Mesh::new("tri");
        mesh.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.faces = vec![[0, 1, 2]];
        if colors {
            mesh.colors = Some(vec![
                Color::rgb(1.0, 0.0, 0.0),
                Color::rgb(0.0, 1.0, 0.0),
                Color::rgb(0.0, 0.0, 1.0),
            ]);
        }
        mesh
    }

    #[test]
    fn header_declares_only_present_channels() {
        let scene = Scene {
            meshes: vec![triangle(false)],
        };
        let text = String::from_utf8(encode_ply(&scene).unwrap()).unwrap();
        assert!(text.contains("element vertex 3"));
        assert!(text.contains("element face 1"));
        assert!(!text.contains("property uchar red"));
        assert!(!text.contains("property float nx"));
    }

    #[test]
    fn colors_are_preserved_as_uchar() {
        let scene = Scene {
            meshes: vec![triangle(true)],
        };
        let text = String::from_utf8(encode_ply(&scene).unwrap()).unwrap();
        assert!(text.contains("property uchar red"));
        assert!(text.contains("0 0 0 255 0 0"));
        assert!(text.contains("1 0 0 0 255 0"));
    }

    #[test]
    fn face_indices_are_offset_per_mesh() {
        let scene = Scene {
            meshes: vec![triangle(false), triangle(false)],
        };
        let text = String::from_utf8(encode_ply(&scene).unwrap()).unwrap();
        assert!(text.contains("3 0 1 2"));
        assert!(text.contains("3 3 4 5"));
    }

    #[test]
    fn empty_scene_is_rejected() {
        assert!(matches!(
            encode_ply(&Scene::new()),
            Err(EncodeError::EmptyScene(MeshFormat::Ply))
        ));
    }
}
