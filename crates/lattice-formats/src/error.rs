//! Codec error types

use lattice_core::MeshFormat;

/// Errors raised while decoding format-specific bytes into a scene.
///
/// Every variant names the offending element (line, facet, property,
/// primitive) so a failed upload can be reported precisely. A failed
/// decode never leaves partial state behind; the scene under construction
/// is dropped with the error.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed {format} header: {detail}")]
    MalformedHeader { format: MeshFormat, detail: String },

    #[error("{format} input truncated at {element}")]
    Truncated { format: MeshFormat, element: String },

    #[error("{format} parse error at {element}: {detail}")]
    Malformed {
        format: MeshFormat,
        element: String,
        detail: String,
    },

    #[error("{format} face index {index} out of range at {element} (vertex count {vertex_count})")]
    IndexOutOfRange {
        format: MeshFormat,
        element: String,
        index: i64,
        vertex_count: usize,
    },

    #[error("unsupported {format} feature: {detail}")]
    Unsupported { format: MeshFormat, detail: String },

    #[error("glTF import failed: {0}")]
    Gltf(#[from] gltf::Error),
}

/// Errors raised while serializing a scene into a target format
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("cannot encode an empty scene to {0}")]
    EmptyScene(MeshFormat),

    #[error("{format} cannot represent {detail}")]
    Unrepresentable { format: MeshFormat, detail: String },

    #[error("glTF serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
