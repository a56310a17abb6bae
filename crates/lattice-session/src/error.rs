//! Session-level errors

use lattice_core::{MeshFormat, UnknownFormatError};
use lattice_formats::{DecodeError, EncodeError};

/// Failures surfaced at the session boundary.
///
/// Every failure is local to one request: a failed load leaves the
/// previous live scene untouched, and a failed export leaves the scene
/// and camera untouched.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UnknownFormatError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("source and target format are both {0}")]
    RedundantConversion(MeshFormat),

    #[error("no scene loaded")]
    NoSceneLoaded,

    #[error("background task failed: {0}")]
    Task(String),
}
