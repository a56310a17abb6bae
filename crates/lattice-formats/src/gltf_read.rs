//! glTF 2.0 / GLB decoder
//!
//! Imports either the JSON document or the binary container from a byte
//! buffer. Buffers must be self-contained (GLB chunks or data URIs);
//! references to external files cannot be resolved at this boundary. The
//! node tree of the default scene is flattened at decode time: each node's
//! world transform is pre-multiplied into its vertex positions so the
//! canonical scene carries no hierarchy.

use glam::{Mat3, Mat4, Vec2, Vec3};
use lattice_core::{Color, Material, Mesh, MeshFormat, Scene};
use tracing::debug;

use crate::error::DecodeError;

pub fn decode_gltf(bytes: &[u8]) -> Result<Scene, DecodeError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;

    let mut scene = Scene::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(root) => {
            for node in root.nodes() {
                flatten_node(&node, Mat4::IDENTITY, &buffers, &mut scene)?;
            }
        }
        None => {
            // A document without a scene still carries meshes; decode them
            // with identity transforms.
            for mesh in document.meshes() {
                append_mesh(&mut scene, &mesh, Mat4::IDENTITY, &buffers)?;
            }
        }
    }

    debug!(
        meshes = scene.meshes.len(),
        vertices = scene.vertex_count(),
        "flattened glTF scene"
    );
    Ok(scene)
}

fn flatten_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    scene: &mut Scene,
) -> Result<(), DecodeError> {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        append_mesh(scene, &mesh, world, buffers)?;
    }
    for child in node.children() {
        flatten_node(&child, world, buffers, scene)?;
    }
    Ok(())
}

fn append_mesh(
    scene: &mut Scene,
    mesh: &gltf::Mesh,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
) -> Result<(), DecodeError> {
    let base_name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh{}", mesh.index()));
    let primitive_count = mesh.primitives().count();

    for primitive in mesh.primitives() {
        let element = format!("{base_name} primitive {}", primitive.index());

        if primitive.mode() != gltf::mesh::Mode::Triangles {
            return Err(DecodeError::Unsupported {
                format: MeshFormat::Gltf,
                detail: format!("{element} uses mode {:?}", primitive.mode()),
            });
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| DecodeError::Malformed {
                format: MeshFormat::Gltf,
                element: element.clone(),
                detail: "primitive has no POSITION attribute".to_string(),
            })?
            .map(|p| world.transform_point3(Vec3::from(p)))
            .collect();

        // Normals transform by the inverse-transpose of the linear part.
        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
        let normals: Option<Vec<Vec3>> = reader.read_normals().map(|iter| {
            iter.map(|n| (normal_matrix * Vec3::from(n)).normalize_or_zero())
                .collect()
        });

        let uvs: Option<Vec<Vec2>> = reader
            .read_tex_coords(0)
            .map(|tc| tc.into_f32().map(Vec2::from).collect());

        let colors: Option<Vec<Color>> = reader.read_colors(0).map(|c| {
            c.into_rgba_f32()
                .map(|[r, g, b, a]| Color::rgba(r, g, b, a))
                .collect()
        });

        for (channel, len) in [
            ("NORMAL", normals.as_ref().map(Vec::len)),
            ("TEXCOORD_0", uvs.as_ref().map(Vec::len)),
            ("COLOR_0", colors.as_ref().map(Vec::len)),
        ] {
            if let Some(len) = len {
                if len != positions.len() {
                    return Err(DecodeError::Malformed {
                        format: MeshFormat::Gltf,
                        element: element.clone(),
                        detail: format!(
                            "{channel} has {len} entries for {} positions",
                            positions.len()
                        ),
                    });
                }
            }
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        if indices.len() % 3 != 0 {
            return Err(DecodeError::Malformed {
                format: MeshFormat::Gltf,
                element: element.clone(),
                detail: format!("index count {} is not a triangle list", indices.len()),
            });
        }
        if let Some(&max) = indices.iter().max() {
            if max as usize >= positions.len() {
                return Err(DecodeError::IndexOutOfRange {
                    format: MeshFormat::Gltf,
                    element,
                    index: max as i64,
                    vertex_count: positions.len(),
                });
            }
        }
        let faces = indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();

        let material = if primitive.material().index().is_some() {
            let pbr = primitive.material().pbr_metallic_roughness();
            let [r, g, b, a] = pbr.base_color_factor();
            Material {
                base_color: Color::rgba(r, g, b, a),
                metalness: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
            }
        } else {
            Material::default()
        };

        let name = if primitive_count > 1 {
            format!("{base_name}.{}", primitive.index())
        } else {
            base_name.clone()
        };

        scene.meshes.push(Mesh {
            name,
            positions,
            normals,
            uvs,
            colors,
            faces,
            material: Some(material),
        });
    }
    Ok(())
}
