//! Lattice Session - Conversion orchestration
//!
//! Owns the single live scene per session: decode and normalization run as
//! background tasks, loads replace the scene atomically (a stale load
//! completion is discarded, never applied), camera commands are serialized
//! through the owned navigation state, and exports read a snapshot of the
//! scene so they interleave freely with navigation.

mod error;
mod export;
mod session;

pub use error::SessionError;
pub use export::{ConversionJob, ExportFile};
pub use session::{LoadOutcome, SceneSummary, Session};
