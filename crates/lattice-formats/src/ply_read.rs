//! Stanford PLY decoder, ASCII and binary little-endian
//!
//! The header declares every element and its properties; values are read
//! strictly in declared order, never an assumed layout. Recognized vertex
//! properties feed the canonical channels, anything else is parsed and
//! discarded so the stream position stays correct for later elements.

use glam::{Vec2, Vec3};
use lattice_core::{Color, Material, Mesh, MeshFormat, Scene};

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    BinaryLittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl Scalar {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "char" | "int8" => Some(Self::Char),
            "uchar" | "uint8" => Some(Self::UChar),
            "short" | "int16" => Some(Self::Short),
            "ushort" | "uint16" => Some(Self::UShort),
            "int" | "int32" => Some(Self::Int),
            "uint" | "uint32" => Some(Self::UInt),
            "float" | "float32" => Some(Self::Float),
            "double" | "float64" => Some(Self::Double),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Char | Self::UChar => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// Scale an integer-typed color channel onto 0.0..=1.0
    fn color_scale(self) -> f64 {
        match self {
            Self::Float | Self::Double => 1.0,
            Self::UShort | Self::Short => 65535.0,
            _ => 255.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PropertyKind {
    Scalar(Scalar),
    List { count: Scalar, item: Scalar },
}

#[derive(Debug)]
struct Property {
    name: String,
    kind: PropertyKind,
}

#[derive(Debug)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug)]
struct Header {
    encoding: Encoding,
    elements: Vec<Element>,
    body_start: usize,
}

fn malformed_header(detail: impl Into<String>) -> DecodeError {
    DecodeError::MalformedHeader {
        format: MeshFormat::Ply,
        detail: detail.into(),
    }
}

fn parse_header(bytes: &[u8]) -> Result<Header, DecodeError> {
    let mut offset = 0;
    let mut encoding = None;
    let mut elements: Vec<Element> = Vec::new();
    let mut saw_magic = false;

    loop {
        let end = bytes[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| offset + i)
            .ok_or_else(|| malformed_header("missing end_header"))?;
        let line = std::str::from_utf8(&bytes[offset..end])
            .map_err(|_| malformed_header("header is not valid UTF-8"))?
            .trim_end_matches('\r')
            .trim();
        offset = end + 1;

        if !saw_magic {
            if line != "ply" {
                return Err(malformed_header("file does not start with \"ply\""));
            }
            saw_magic = true;
            continue;
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("comment") | Some("obj_info") | None => {}
            Some("format") => {
                encoding = Some(match tokens.next() {
                    Some("ascii") => Encoding::Ascii,
                    Some("binary_little_endian") => Encoding::BinaryLittleEndian,
                    Some("binary_big_endian") => {
                        return Err(DecodeError::Unsupported {
                            format: MeshFormat::Ply,
                            detail: "binary_big_endian encoding".to_string(),
                        })
                    }
                    other => {
                        return Err(malformed_header(format!(
                            "unknown format {other:?}"
                        )))
                    }
                });
            }
            Some("element") => {
                let name = tokens
                    .next()
                    .ok_or_else(|| malformed_header("element without a name"))?;
                let count = tokens
                    .next()
                    .and_then(|t| t.parse::<usize>().ok())
                    .ok_or_else(|| {
                        malformed_header(format!("element {name} has no valid count"))
                    })?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| malformed_header("property before any element"))?;
                let first = tokens
                    .next()
                    .ok_or_else(|| malformed_header("property without a type"))?;
                let (kind, name) = if first == "list" {
                    let count = tokens
                        .next()
                        .and_then(Scalar::parse)
                        .ok_or_else(|| malformed_header("list property count type"))?;
                    let item = tokens
                        .next()
                        .and_then(Scalar::parse)
                        .ok_or_else(|| malformed_header("list property item type"))?;
                    (PropertyKind::List { count, item }, tokens.next())
                } else {
                    let scalar = Scalar::parse(first).ok_or_else(|| {
                        malformed_header(format!("unknown property type {first:?}"))
                    })?;
                    (PropertyKind::Scalar(scalar), tokens.next())
                };
                let name =
                    name.ok_or_else(|| malformed_header("property without a name"))?;
                element.properties.push(Property {
                    name: name.to_string(),
                    kind,
                });
            }
            Some("end_header") => {
                let encoding =
                    encoding.ok_or_else(|| malformed_header("missing format line"))?;
                return Ok(Header {
                    encoding,
                    elements,
                    body_start: offset,
                });
            }
            Some(other) => {
                return Err(malformed_header(format!("unknown keyword {other:?}")));
            }
        }
    }
}

/// Reads scalar values from the body in declared order, for either encoding
enum ValueReader<'a> {
    Ascii(std::str::SplitWhitespace<'a>),
    Binary { bytes: &'a [u8], offset: usize },
}

impl<'a> ValueReader<'a> {
    fn new(bytes: &'a [u8], header: &Header) -> Result<Self, DecodeError> {
        match header.encoding {
            Encoding::Ascii => {
                let text = std::str::from_utf8(&bytes[header.body_start..]).map_err(|_| {
                    DecodeError::Malformed {
                        format: MeshFormat::Ply,
                        element: "body".to_string(),
                        detail: "ASCII body is not valid UTF-8 text".to_string(),
                    }
                })?;
                Ok(Self::Ascii(text.split_whitespace()))
            }
            Encoding::BinaryLittleEndian => Ok(Self::Binary {
                bytes: &bytes[header.body_start..],
                offset: 0,
            }),
        }
    }

    fn scalar(&mut self, kind: Scalar, element: &str, row: usize) -> Result<f64, DecodeError> {
        match self {
            Self::Ascii(tokens) => {
                let token = tokens.next().ok_or_else(|| DecodeError::Truncated {
                    format: MeshFormat::Ply,
                    element: format!("{element} {row}"),
                })?;
                token.parse::<f64>().map_err(|_| DecodeError::Malformed {
                    format: MeshFormat::Ply,
                    element: format!("{element} {row}"),
                    detail: format!("invalid value {token:?}"),
                })
            }
            Self::Binary { bytes, offset } => {
                let size = kind.size();
                let end = *offset + size;
                if end > bytes.len() {
                    return Err(DecodeError::Truncated {
                        format: MeshFormat::Ply,
                        element: format!("{element} {row}"),
                    });
                }
                let raw = &bytes[*offset..end];
                *offset = end;
                Ok(match kind {
                    Scalar::Char => raw[0] as i8 as f64,
                    Scalar::UChar => raw[0] as f64,
                    Scalar::Short => {
                        i16::from_le_bytes(raw.try_into().unwrap_or_default()) as f64
                    }
                    Scalar::UShort => {
                        u16::from_le_bytes(raw.try_into().unwrap_or_default()) as f64
                    }
                    Scalar::Int => {
                        i32::from_le_bytes(raw.try_into().unwrap_or_default()) as f64
                    }
                    Scalar::UInt => {
                        u32::from_le_bytes(raw.try_into().unwrap_or_default()) as f64
                    }
                    Scalar::Float => {
                        f32::from_le_bytes(raw.try_into().unwrap_or_default()) as f64
                    }
                    Scalar::Double => {
                        f64::from_le_bytes(raw.try_into().unwrap_or_default())
                    }
                })
            }
        }
    }
}

/// Where a declared vertex property lands in the canonical channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexSlot {
    X,
    Y,
    Z,
    Nx,
    Ny,
    Nz,
    U,
    V,
    Red,
    Green,
    Blue,
    Alpha,
    Ignored,
}

fn vertex_slot(name: &str) -> VertexSlot {
    match name {
        "x" => VertexSlot::X,
        "y" => VertexSlot::Y,
        "z" => VertexSlot::Z,
        "nx" => VertexSlot::Nx,
        "ny" => VertexSlot::Ny,
        "nz" => VertexSlot::Nz,
        "s" | "u" | "texture_u" => VertexSlot::U,
        "t" | "v" | "texture_v" => VertexSlot::V,
        "red" => VertexSlot::Red,
        "green" => VertexSlot::Green,
        "blue" => VertexSlot::Blue,
        "alpha" => VertexSlot::Alpha,
        _ => VertexSlot::Ignored,
    }
}

pub fn decode_ply(bytes: &[u8]) -> Result<Scene, DecodeError> {
    let header = parse_header(bytes)?;
    let mut reader = ValueReader::new(bytes, &header)?;

    let vertex_count = header
        .elements
        .iter()
        .find(|e| e.name == "vertex")
        .map(|e| e.count)
        .unwrap_or(0);

    let mut mesh = Mesh::new("mesh");
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut colors: Vec<Color> = Vec::new();
    let mut has_normals = false;
    let mut has_uvs = false;
    let mut has_colors = false;

    for element in &header.elements {
        match element.name.as_str() {
            "vertex" => {
                let slots: Vec<(VertexSlot, PropertyKind)> = element
                    .properties
                    .iter()
                    .map(|p| (vertex_slot(&p.name), p.kind))
                    .collect();
                let declared = |slot: VertexSlot| {
                    slots
                        .iter()
                        .any(|(s, k)| *s == slot && matches!(k, PropertyKind::Scalar(_)))
                };
                if !(declared(VertexSlot::X)
                    && declared(VertexSlot::Y)
                    && declared(VertexSlot::Z))
                {
                    return Err(malformed_header(
                        "vertex element does not declare x, y, z",
                    ));
                }
                has_normals = declared(VertexSlot::Nx)
                    && declared(VertexSlot::Ny)
                    && declared(VertexSlot::Nz);
                has_uvs = declared(VertexSlot::U) && declared(VertexSlot::V);
                has_colors = declared(VertexSlot::Red)
                    && declared(VertexSlot::Green)
                    && declared(VertexSlot::Blue);

                for row in 0..element.count {
                    let mut position = Vec3::ZERO;
                    let mut normal = Vec3::ZERO;
                    let mut uv = Vec2::ZERO;
                    let mut rgba = [0.0f32, 0.0, 0.0, 1.0];
                    for (slot, kind) in &slots {
                        match kind {
                            PropertyKind::Scalar(scalar) => {
                                let value = reader.scalar(*scalar, "vertex", row)?;
                                let color_value =
                                    (value / scalar.color_scale()) as f32;
                                match slot {
                                    VertexSlot::X => position.x = value as f32,
                                    VertexSlot::Y => position.y = value as f32,
                                    VertexSlot::Z => position.z = value as f32,
                                    VertexSlot::Nx => normal.x = value as f32,
                                    VertexSlot::Ny => normal.y = value as f32,
                                    VertexSlot::Nz => normal.z = value as f32,
                                    VertexSlot::U => uv.x = value as f32,
                                    VertexSlot::V => uv.y = value as f32,
                                    VertexSlot::Red => rgba[0] = color_value,
                                    VertexSlot::Green => rgba[1] = color_value,
                                    VertexSlot::Blue => rgba[2] = color_value,
                                    VertexSlot::Alpha => rgba[3] = color_value,
                                    VertexSlot::Ignored => {}
                                }
                            }
                            PropertyKind::List { count, item } => {
                                // A list on a vertex is unusual; consume it
                                // to keep the stream position.
                                let n = reader.scalar(*count, "vertex", row)? as usize;
                                for _ in 0..n {
                                    reader.scalar(*item, "vertex", row)?;
                                }
                            }
                        }
                    }
                    mesh.positions.push(position);
                    if has_normals {
                        normals.push(normal);
                    }
                    if has_uvs {
                        uvs.push(uv);
                    }
                    if has_colors {
                        colors.push(Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]));
                    }
                }
            }
            "face" => {
                for row in 0..element.count {
                    for property in &element.properties {
                        match property.kind {
                            PropertyKind::List { count, item }
                                if property.name == "vertex_indices"
                                    || property.name == "vertex_index" =>
                            {
                                let n = reader.scalar(count, "face", row)? as usize;
                                if n < 3 {
                                    return Err(DecodeError::Malformed {
                                        format: MeshFormat::Ply,
                                        element: format!("face {row}"),
                                        detail: format!(
                                            "face has {n} indices, expected at least 3"
                                        ),
                                    });
                                }
                                let mut indices = Vec::with_capacity(n);
                                for _ in 0..n {
                                    let index = reader.scalar(item, "face", row)? as i64;
                                    if index < 0 || index as usize >= vertex_count {
                                        return Err(DecodeError::IndexOutOfRange {
                                            format: MeshFormat::Ply,
                                            element: format!("face {row}"),
                                            index,
                                            vertex_count,
                                        });
                                    }
                                    indices.push(index as u32);
                                }
                                for i in 1..n - 1 {
                                    mesh.faces.push([
                                        indices[0],
                                        indices[i],
                                        indices[i + 1],
                                    ]);
                                }
                            }
                            PropertyKind::List { count, item } => {
                                let n = reader.scalar(count, "face", row)? as usize;
                                for _ in 0..n {
                                    reader.scalar(item, "face", row)?;
                                }
                            }
                            PropertyKind::Scalar(scalar) => {
                                reader.scalar(scalar, "face", row)?;
                            }
                        }
                    }
                }
            }
            // Unknown elements (edges, custom data) are consumed so any
            // element declared after them still reads correctly.
            _ => {
                for row in 0..element.count {
                    for property in &element.properties {
                        match property.kind {
                            PropertyKind::Scalar(scalar) => {
                                reader.scalar(scalar, &element.name, row)?;
                            }
                            PropertyKind::List { count, item } => {
                                let n =
                                    reader.scalar(count, &element.name, row)? as usize;
                                for _ in 0..n {
                                    reader.scalar(item, &element.name, row)?;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    if has_normals {
        mesh.normals = Some(normals);
    }
    if has_uvs {
        mesh.uvs = Some(uvs);
    }
    if has_colors {
        mesh.colors = Some(colors);
    }
    mesh.material = Some(Material::default());

    Ok(Scene { meshes: vec![mesh] })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_TRIANGLE: &str = "\
ply
format ascii 1.0
comment exported fixture
element vertex 3
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
element face 1
property list uchar int vertex_indices
end_header
0 0 0 255 0 0
1 0 0 0 255 0
0 1 0 0 0 255
3 0 1 2
";

    #[test]
    fn ascii_vertices_and_colors_decode() {
        let scene = decode_ply(ASCII_TRIANGLE.as_bytes()).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        let colors = mesh.colors.as_ref().unwrap();
        assert!((colors[0].r - 1.0).abs() < 1e-6);
        assert!((colors[1].g - 1.0).abs() < 1e-6);
        assert!((colors[2].b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn property_order_is_taken_from_the_header() {
        // Color declared before position; values must land by name.
        let input = "\
ply
format ascii 1.0
element vertex 1
property uchar red
property uchar green
property uchar blue
property float x
property float y
property float z
end_header
255 128 0 2 3 4
";
        let scene = decode_ply(input.as_bytes()).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.positions[0], Vec3::new(2.0, 3.0, 4.0));
        let color = mesh.colors.as_ref().unwrap()[0];
        assert_eq!(color.to_u8(), [255, 128, 0]);
    }

    #[test]
    fn unknown_properties_are_consumed_in_order() {
        let input = "\
ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
property float confidence
element face 1
property list uchar int vertex_indices
end_header
1 2 3 0.5
3 0 0 0
";
        let scene = decode_ply(input.as_bytes()).unwrap();
        assert_eq!(scene.meshes[0].positions[0], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.meshes[0].triangle_count(), 1);
    }

    #[test]
    fn binary_little_endian_decodes() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(
            b"ply\nformat binary_little_endian 1.0\n\
              element vertex 3\n\
              property float x\nproperty float y\nproperty float z\n\
              element face 1\n\
              property list uchar uint vertex_indices\n\
              end_header\n",
        );
        for position in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for component in position {
                bytes.extend_from_slice(&component.to_le_bytes());
            }
        }
        bytes.push(3);
        for index in [0u32, 1, 2] {
            bytes.extend_from_slice(&index.to_le_bytes());
        }

        let scene = decode_ply(&bytes).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.positions[1], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn quad_faces_are_fan_triangulated() {
        let input = "\
ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3
";
        let scene = decode_ply(input.as_bytes()).unwrap();
        assert_eq!(scene.meshes[0].faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn out_of_range_face_index_is_rejected() {
        let input = "\
ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
3 0 1 2
";
        let err = decode_ply(input.as_bytes()).unwrap_err();
        match err {
            DecodeError::IndexOutOfRange {
                index,
                vertex_count,
                ..
            } => {
                assert_eq!(index, 2);
                assert_eq!(vertex_count, 2);
            }
            other => panic!("expected IndexOutOfRange, got: {other:?}"),
        }
    }

    #[test]
    fn big_endian_is_unsupported() {
        let input = "ply\nformat binary_big_endian 1.0\nend_header\n";
        let err = decode_ply(input.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported { .. }));
    }

    #[test]
    fn truncated_ascii_body_is_rejected() {
        let input = "\
ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
end_header
0 0 0
1 0
";
        let err = decode_ply(input.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }
}
