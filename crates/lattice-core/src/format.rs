//! Supported mesh format tags
//!
//! The format set is fixed and closed; both the ingestion and export
//! boundaries reject any tag outside it before a codec runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A format tag outside the supported set
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported format tag: {0:?}")]
pub struct UnknownFormatError(pub String);

/// The supported mesh interchange formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    /// Wavefront OBJ (text)
    Obj,
    /// Stereolithography, ASCII or binary little-endian
    Stl,
    /// Stanford PLY, ASCII or binary little-endian
    Ply,
    /// glTF 2.0 JSON document with embedded buffers
    Gltf,
    /// Binary glTF 2.0 container
    Glb,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 5] = [Self::Obj, Self::Stl, Self::Ply, Self::Gltf, Self::Glb];

    /// Parse a user-supplied tag, case-insensitively
    pub fn parse_tag(tag: &str) -> Result<Self, UnknownFormatError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "obj" => Ok(Self::Obj),
            "stl" => Ok(Self::Stl),
            "ply" => Ok(Self::Ply),
            "gltf" => Ok(Self::Gltf),
            "glb" => Ok(Self::Glb),
            _ => Err(UnknownFormatError(tag.to_string())),
        }
    }

    /// Canonical file extension for exports
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Stl => "stl",
            Self::Ply => "ply",
            Self::Gltf => "gltf",
            Self::Glb => "glb",
        }
    }

    /// Content-type classification for delivering exported bytes
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Obj | Self::Ply => "text/plain",
            Self::Stl => "model/stl",
            Self::Gltf => "application/json",
            Self::Glb => "model/gltf-binary",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for MeshFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_tag(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(MeshFormat::parse_tag("obj").unwrap(), MeshFormat::Obj);
        assert_eq!(MeshFormat::parse_tag("STL").unwrap(), MeshFormat::Stl);
        assert_eq!(MeshFormat::parse_tag("GlTF").unwrap(), MeshFormat::Gltf);
        assert_eq!(MeshFormat::parse_tag(" glb ").unwrap(), MeshFormat::Glb);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = MeshFormat::parse_tag("fbx").unwrap_err();
        assert!(err.to_string().contains("fbx"));
    }

    #[test]
    fn content_types_match_delivery_table() {
        assert_eq!(MeshFormat::Stl.content_type(), "model/stl");
        assert_eq!(MeshFormat::Obj.content_type(), "text/plain");
        assert_eq!(MeshFormat::Ply.content_type(), "text/plain");
        assert_eq!(MeshFormat::Gltf.content_type(), "application/json");
        assert_eq!(MeshFormat::Glb.content_type(), "model/gltf-binary");
    }
}
