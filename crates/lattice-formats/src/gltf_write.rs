//! glTF 2.0 / GLB encoder
//!
//! Builds one glTF document over a single packed binary buffer: per mesh
//! an indexed triangle primitive, its vertex channels, and a material from
//! the mesh's flat `Material`. The `gltf` target embeds the buffer as a
//! base64 data URI inside the JSON document; the `glb` target packs the
//! same document and buffer into the binary container. The split is a
//! packaging detail only — both carry identical scene content.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lattice_core::{MeshFormat, Scene};
use serde_json::{json, Value};

use crate::error::EncodeError;

const COMPONENT_F32: u32 = 5126;
const COMPONENT_U32: u32 = 5125;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_TRIANGLES: u32 = 4;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;
const GLB_CHUNK_BIN: u32 = 0x004E_4942;

/// Accumulates the single binary buffer and its views, keeping every view
/// 4-byte aligned as the accessor component types require
struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<Value>,
}

impl BufferBuilder {
    fn new() -> Self {
        Self {
            data: Vec::new(),
            views: Vec::new(),
        }
    }

    fn push_view(&mut self, bytes: &[u8], target: u32) -> usize {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
            "target": target,
        }));
        self.views.len() - 1
    }
}

fn le_bytes(values: impl IntoIterator<Item = f32>) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

fn build_document(scene: &Scene, format: MeshFormat) -> Result<(Value, Vec<u8>), EncodeError> {
    if scene.is_empty() {
        return Err(EncodeError::EmptyScene(format));
    }

    let mut buffer = BufferBuilder::new();
    let mut accessors: Vec<Value> = Vec::new();
    let mut meshes: Vec<Value> = Vec::new();
    let mut materials: Vec<Value> = Vec::new();
    let mut nodes: Vec<Value> = Vec::new();

    for mesh in &scene.meshes {
        if mesh.faces.is_empty() || mesh.positions.is_empty() {
            continue;
        }

        let mut min = mesh.positions[0];
        let mut max = mesh.positions[0];
        for &p in &mesh.positions {
            min = min.min(p);
            max = max.max(p);
        }
        let position_bytes = le_bytes(mesh.positions.iter().flat_map(|p| p.to_array()));
        let view = buffer.push_view(&position_bytes, TARGET_ARRAY_BUFFER);
        let position_accessor = accessors.len();
        accessors.push(json!({
            "bufferView": view,
            "componentType": COMPONENT_F32,
            "count": mesh.positions.len(),
            "type": "VEC3",
            "min": [min.x, min.y, min.z],
            "max": [max.x, max.y, max.z],
        }));

        let mut attributes = serde_json::Map::new();
        attributes.insert("POSITION".to_string(), json!(position_accessor));

        if let Some(normals) = &mesh.normals {
            let bytes = le_bytes(normals.iter().flat_map(|n| n.to_array()));
            let view = buffer.push_view(&bytes, TARGET_ARRAY_BUFFER);
            attributes.insert("NORMAL".to_string(), json!(accessors.len()));
            accessors.push(json!({
                "bufferView": view,
                "componentType": COMPONENT_F32,
                "count": normals.len(),
                "type": "VEC3",
            }));
        }
        if let Some(uvs) = &mesh.uvs {
            let bytes = le_bytes(uvs.iter().flat_map(|t| t.to_array()));
            let view = buffer.push_view(&bytes, TARGET_ARRAY_BUFFER);
            attributes.insert("TEXCOORD_0".to_string(), json!(accessors.len()));
            accessors.push(json!({
                "bufferView": view,
                "componentType": COMPONENT_F32,
                "count": uvs.len(),
                "type": "VEC2",
            }));
        }
        if let Some(colors) = &mesh.colors {
            let bytes = le_bytes(colors.iter().flat_map(|c| c.to_array()));
            let view = buffer.push_view(&bytes, TARGET_ARRAY_BUFFER);
            attributes.insert("COLOR_0".to_string(), json!(accessors.len()));
            accessors.push(json!({
                "bufferView": view,
                "componentType": COMPONENT_F32,
                "count": colors.len(),
                "type": "VEC4",
            }));
        }

        let mut index_bytes = Vec::with_capacity(mesh.faces.len() * 12);
        for face in &mesh.faces {
            for &index in face {
                index_bytes.extend_from_slice(&index.to_le_bytes());
            }
        }
        let view = buffer.push_view(&index_bytes, TARGET_ELEMENT_ARRAY_BUFFER);
        let index_accessor = accessors.len();
        accessors.push(json!({
            "bufferView": view,
            "componentType": COMPONENT_U32,
            "count": mesh.faces.len() * 3,
            "type": "SCALAR",
        }));

        let material = mesh.material.unwrap_or_default();
        let material_index = materials.len();
        materials.push(json!({
            "name": format!("{}-material", mesh.name),
            "pbrMetallicRoughness": {
                "baseColorFactor": material.base_color.to_array(),
                "metallicFactor": material.metalness,
                "roughnessFactor": material.roughness,
            },
        }));

        nodes.push(json!({ "mesh": meshes.len(), "name": mesh.name }));
        meshes.push(json!({
            "name": mesh.name,
            "primitives": [{
                "attributes": attributes,
                "indices": index_accessor,
                "material": material_index,
                "mode": MODE_TRIANGLES,
            }],
        }));
    }

    if meshes.is_empty() {
        return Err(EncodeError::Unrepresentable {
            format,
            detail: "a scene without any triangle faces".to_string(),
        });
    }

    let document = json!({
        "asset": { "version": "2.0", "generator": "lattice" },
        "scene": 0,
        "scenes": [{ "nodes": (0..nodes.len()).collect::<Vec<_>>() }],
        "nodes": nodes,
        "meshes": meshes,
        "materials": materials,
        "accessors": accessors,
        "bufferViews": buffer.views,
    });

    Ok((document, buffer.data))
}

/// Encode as a JSON glTF document with the buffer embedded as a data URI
pub fn encode_gltf(scene: &Scene) -> Result<Vec<u8>, EncodeError> {
    let (mut document, buffer) = build_document(scene, MeshFormat::Gltf)?;
    document["buffers"] = json!([{
        "byteLength": buffer.len(),
        "uri": format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(&buffer)
        ),
    }]);
    Ok(serde_json::to_vec(&document)?)
}

/// Encode as a binary GLB container (header + JSON chunk + BIN chunk)
pub fn encode_glb(scene: &Scene) -> Result<Vec<u8>, EncodeError> {
    let (mut document, mut buffer) = build_document(scene, MeshFormat::Glb)?;
    document["buffers"] = json!([{ "byteLength": buffer.len() }]);

    let mut json_bytes = serde_json::to_vec(&document)?;
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }

    let total = 12 + 8 + json_bytes.len() + 8 + buffer.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_bytes);
    out.extend_from_slice(&(buffer.len() as u32).to_le_bytes());
    out.extend_from_slice(&GLB_CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&buffer);
    Ok(out)
}
