//! STL decoder, ASCII and binary little-endian
//!
//! STL carries raw triangle soup only: every facet contributes three fresh
//! vertices (no shared-vertex dedup), facet normals are replicated
//! per-vertex, and a default material is synthesized since the format has
//! no color, UV, or material data.

use glam::Vec3;
use lattice_core::{Material, Mesh, MeshFormat, Scene};

use crate::error::DecodeError;

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

pub fn decode_stl(bytes: &[u8]) -> Result<Scene, DecodeError> {
    if looks_binary(bytes) {
        decode_binary(bytes)
    } else {
        decode_ascii(bytes)
    }
}

/// ASCII files start with `solid`, but so can the free-form 80-byte header
/// of a binary file; the byte length settles it — a binary file is exactly
/// `84 + 50*n` bytes for the count stored at offset 80.
fn looks_binary(bytes: &[u8]) -> bool {
    if !bytes.starts_with(b"solid") {
        return true;
    }
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = read_u32(bytes, HEADER_LEN) as usize;
    bytes.len() == HEADER_LEN + 4 + count * RECORD_LEN
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_le_bytes(raw)
}

fn read_vec3(bytes: &[u8], offset: usize) -> Vec3 {
    Vec3::new(
        read_f32(bytes, offset),
        read_f32(bytes, offset + 4),
        read_f32(bytes, offset + 8),
    )
}

fn decode_binary(bytes: &[u8]) -> Result<Scene, DecodeError> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(DecodeError::MalformedHeader {
            format: MeshFormat::Stl,
            detail: format!("binary header needs 84 bytes, got {}", bytes.len()),
        });
    }
    let count = read_u32(bytes, HEADER_LEN) as usize;
    let expected = HEADER_LEN + 4 + count * RECORD_LEN;
    if bytes.len() < expected {
        let complete = bytes.len().saturating_sub(HEADER_LEN + 4) / RECORD_LEN;
        return Err(DecodeError::Truncated {
            format: MeshFormat::Stl,
            element: format!("facet {complete} of {count}"),
        });
    }

    let mut mesh = Mesh::new("mesh");
    let mut normals = Vec::with_capacity(count * 3);
    for i in 0..count {
        let offset = HEADER_LEN + 4 + i * RECORD_LEN;
        let normal = read_vec3(bytes, offset);
        let base = mesh.positions.len() as u32;
        for corner in 0..3 {
            mesh.positions.push(read_vec3(bytes, offset + 12 + corner * 12));
            normals.push(normal);
        }
        // Trailing u16 attribute byte count is ignored.
        mesh.faces.push([base, base + 1, base + 2]);
    }

    mesh.normals = Some(normals);
    mesh.material = Some(Material::default());
    Ok(Scene { meshes: vec![mesh] })
}

fn parse_vec3(
    mut tokens: std::str::SplitWhitespace<'_>,
    line: usize,
    record: &str,
) -> Result<Vec3, DecodeError> {
    let mut out = [0.0f32; 3];
    for slot in &mut out {
        let token = tokens.next().ok_or_else(|| DecodeError::Malformed {
            format: MeshFormat::Stl,
            element: format!("line {line}"),
            detail: format!("{record} record has too few components"),
        })?;
        *slot = token.parse().map_err(|_| DecodeError::Malformed {
            format: MeshFormat::Stl,
            element: format!("line {line}"),
            detail: format!("invalid float {token:?} in {record} record"),
        })?;
    }
    Ok(Vec3::from_array(out))
}

fn decode_ascii(bytes: &[u8]) -> Result<Scene, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Malformed {
        format: MeshFormat::Stl,
        element: "document".to_string(),
        detail: "ASCII body is not valid UTF-8 text".to_string(),
    })?;

    let mut mesh = Mesh::new("mesh");
    let mut normals: Vec<Vec3> = Vec::new();
    let mut facet_normal = Vec3::ZERO;
    let mut facet_vertices: Vec<Vec3> = Vec::new();
    let mut in_facet = false;

    for (line_index, raw_line) in text.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw_line.trim();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("solid") => {
                if let Some(name) = tokens.next() {
                    mesh.name = name.to_string();
                }
            }
            Some("facet") => {
                // "facet normal nx ny nz"
                tokens.next();
                facet_normal = parse_vec3(tokens, line_no, "facet normal")?;
                facet_vertices.clear();
                in_facet = true;
            }
            Some("vertex") => {
                if !in_facet {
                    return Err(DecodeError::Malformed {
                        format: MeshFormat::Stl,
                        element: format!("line {line_no}"),
                        detail: "vertex record outside a facet".to_string(),
                    });
                }
                facet_vertices.push(parse_vec3(tokens, line_no, "vertex")?);
            }
            Some("endfacet") => {
                if facet_vertices.len() != 3 {
                    return Err(DecodeError::Malformed {
                        format: MeshFormat::Stl,
                        element: format!("line {line_no}"),
                        detail: format!(
                            "facet has {} vertices, expected 3",
                            facet_vertices.len()
                        ),
                    });
                }
                let base = mesh.positions.len() as u32;
                for &vertex in &facet_vertices {
                    mesh.positions.push(vertex);
                    normals.push(facet_normal);
                }
                mesh.faces.push([base, base + 1, base + 2]);
                in_facet = false;
            }
            // "outer loop", "endloop", "endsolid", blanks
            _ => {}
        }
    }

    if in_facet {
        return Err(DecodeError::Truncated {
            format: MeshFormat::Stl,
            element: format!("facet {}", mesh.faces.len()),
        });
    }

    mesh.normals = Some(normals);
    mesh.material = Some(Material::default());
    Ok(Scene { meshes: vec![mesh] })
}
