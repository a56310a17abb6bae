//! Lattice Core - Canonical scene model for the lattice mesh interchange core
//!
//! This crate provides the foundational types shared by every other crate:
//! - The canonical `Scene`/`Mesh` representation all decoders produce and
//!   all encoders consume
//! - Flat `Material` and `Color` types
//! - Axis-aligned bounds used for normalization and camera framing
//! - The closed set of supported mesh format tags

pub mod bounds;
pub mod format;
pub mod scene;
pub mod types;

pub use bounds::Aabb;
pub use format::{MeshFormat, UnknownFormatError};
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use scene::{Material, Mesh, Scene};
pub use types::Color;
