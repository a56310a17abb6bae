//! Wavefront OBJ decoder
//!
//! Streaming parser for the common OBJ constructs (v, vt, vn, f, o).
//! Polygon faces are fan-triangulated from their first vertex; negative
//! indices are resolved against the running count of the respective
//! channel. `mtllib`/`usemtl` name side files the byte boundary cannot
//! fetch, so they are skipped and a default material is synthesized.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use lattice_core::{Material, Mesh, MeshFormat, Scene};

use crate::error::DecodeError;

/// One corner of an OBJ face: raw 1-based (or negative) indices, 0 = absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CornerKey {
    v: i32,
    vt: i32,
    vn: i32,
}

fn parse_corner(token: &str) -> CornerKey {
    let mut parts = token
        .split('/')
        .map(|s| if s.is_empty() { None } else { s.parse::<i32>().ok() });
    let v = parts.next().flatten().unwrap_or(0);
    let vt = parts.next().flatten().unwrap_or(0);
    let vn = parts.next().flatten().unwrap_or(0);
    CornerKey { v, vt, vn }
}

/// Resolve a 1-based or negative-relative index against the running count
fn resolve_index(
    index: i32,
    len: usize,
    line: usize,
    channel: &str,
) -> Result<usize, DecodeError> {
    let resolved = if index > 0 {
        (index as i64) - 1
    } else {
        (len as i64) + (index as i64)
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(DecodeError::IndexOutOfRange {
            format: MeshFormat::Obj,
            element: format!("{channel} reference on line {line}"),
            index: index as i64,
            vertex_count: len,
        });
    }
    Ok(resolved as usize)
}

fn parse_floats<const N: usize>(
    mut tokens: std::str::SplitWhitespace<'_>,
    line: usize,
    record: &str,
) -> Result<[f32; N], DecodeError> {
    let mut out = [0.0; N];
    for slot in &mut out {
        let token = tokens.next().ok_or_else(|| DecodeError::Malformed {
            format: MeshFormat::Obj,
            element: format!("line {line}"),
            detail: format!("{record} record has too few components"),
        })?;
        *slot = token.parse().map_err(|_| DecodeError::Malformed {
            format: MeshFormat::Obj,
            element: format!("line {line}"),
            detail: format!("invalid float {token:?} in {record} record"),
        })?;
    }
    Ok(out)
}

pub fn decode_obj(bytes: &[u8]) -> Result<Scene, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Malformed {
        format: MeshFormat::Obj,
        element: "document".to_string(),
        detail: "input is not valid UTF-8 text".to_string(),
    })?;

    // Raw declaration-order channels the face corners index into.
    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();

    let mut mesh = Mesh::new("mesh");
    let mut out_uvs: Vec<Vec2> = Vec::new();
    let mut out_normals: Vec<Vec3> = Vec::new();
    let mut any_uv = false;
    let mut any_normal = false;

    // Welds identical v/vt/vn corners onto one canonical vertex.
    let mut corners: HashMap<CornerKey, u32> = HashMap::new();

    for (line_index, raw_line) in text.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let tag = tokens.next().unwrap_or("");
        match tag {
            "v" => {
                let [x, y, z] = parse_floats(tokens, line_no, "v")?;
                positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats(tokens, line_no, "vt")?;
                uvs.push(Vec2::new(u, v));
            }
            "vn" => {
                let [x, y, z] = parse_floats(tokens, line_no, "vn")?;
                normals.push(Vec3::new(x, y, z));
            }
            "o" => {
                if mesh.name == "mesh" {
                    if let Some(name) = tokens.next() {
                        mesh.name = name.to_string();
                    }
                }
            }
            "f" => {
                let face: Vec<CornerKey> = tokens.map(parse_corner).collect();
                if face.len() < 3 {
                    return Err(DecodeError::Malformed {
                        format: MeshFormat::Obj,
                        element: format!("line {line_no}"),
                        detail: "face has fewer than 3 vertices".to_string(),
                    });
                }
                if face.iter().any(|corner| corner.v == 0) {
                    return Err(DecodeError::Malformed {
                        format: MeshFormat::Obj,
                        element: format!("line {line_no}"),
                        detail: "face corner is missing its position index".to_string(),
                    });
                }

                // Fan triangulation from the first corner.
                for i in 1..face.len() - 1 {
                    let mut triangle = [0u32; 3];
                    for (slot, corner) in
                        triangle.iter_mut().zip([face[0], face[i], face[i + 1]])
                    {
                        *slot = emit_corner(
                            corner,
                            line_no,
                            &positions,
                            &uvs,
                            &normals,
                            &mut mesh,
                            &mut out_uvs,
                            &mut out_normals,
                            &mut any_uv,
                            &mut any_normal,
                            &mut corners,
                        )?;
                    }
                    mesh.faces.push(triangle);
                }
            }
            // Grouping, smoothing, and material records carry no geometry.
            _ => {}
        }
    }

    if any_uv {
        mesh.uvs = Some(out_uvs);
    }
    if any_normal {
        mesh.normals = Some(out_normals);
    }
    mesh.material = Some(Material::default());

    Ok(Scene { meshes: vec![mesh] })
}

/// Weld one face corner into the output mesh, returning its vertex index
#[allow(clippy::too_many_arguments)]
fn emit_corner(
    corner: CornerKey,
    line_no: usize,
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    mesh: &mut Mesh,
    out_uvs: &mut Vec<Vec2>,
    out_normals: &mut Vec<Vec3>,
    any_uv: &mut bool,
    any_normal: &mut bool,
    corners: &mut HashMap<CornerKey, u32>,
) -> Result<u32, DecodeError> {
    if let Some(&index) = corners.get(&corner) {
        return Ok(index);
    }

    let vi = resolve_index(corner.v, positions.len(), line_no, "position")?;
    mesh.positions.push(positions[vi]);

    // Corners that omit vt/vn while other corners carry them pad with
    // zeros; the channel stays aligned with the position list.
    if corner.vt != 0 {
        let ti = resolve_index(corner.vt, uvs.len(), line_no, "texcoord")?;
        out_uvs.resize(mesh.positions.len() - 1, Vec2::ZERO);
        out_uvs.push(uvs[ti]);
        *any_uv = true;
    } else if *any_uv {
        out_uvs.push(Vec2::ZERO);
    }

    if corner.vn != 0 {
        let ni = resolve_index(corner.vn, normals.len(), line_no, "normal")?;
        out_normals.resize(mesh.positions.len() - 1, Vec3::ZERO);
        out_normals.push(normals[ni]);
        *any_normal = true;
    } else if *any_normal {
        out_normals.push(Vec3::ZERO);
    }

    let index = (mesh.positions.len() - 1) as u32;
    corners.insert(corner, index);
    Ok(index)
}
