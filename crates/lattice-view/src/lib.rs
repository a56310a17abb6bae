//! Lattice View - Scene normalization and camera navigation
//!
//! Provides the one-shot normalizer that recenters a freshly decoded scene
//! and derives its initial camera framing, plus the orbit camera state
//! machine driven by discrete navigation commands.

mod camera;
mod normalize;

pub use camera::{CameraCommand, CameraState, OrbitCamera, MIN_DISTANCE, ROTATE_STEP, ZOOM_STEP};
pub use normalize::{normalize, Framing, DISTANCE_FACTOR, FALLBACK_DISTANCE};
