//! Orbit camera with discrete navigation commands

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Fraction of the current distance-to-target moved per zoom step
pub const ZOOM_STEP: f32 = 0.2;

/// Radians rotated around the vertical axis per rotate step
pub const ROTATE_STEP: f32 = 0.1;

/// Closest the camera may orbit; zooming in from here is a no-op
pub const MIN_DISTANCE: f32 = 1e-3;

/// A discrete, parameterless navigation command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraCommand {
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
    TopView,
    BottomView,
}

/// Camera position, orbit pivot, and up vector.
///
/// The target is the scene's normalized center (the origin at load time)
/// and stays the orbit pivot for the lifetime of one loaded scene. The up
/// vector is fixed to world Y; no command changes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

/// The camera state machine behind the navigation command boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    state: CameraState,
}

impl OrbitCamera {
    /// Frame the origin from the canonical viewing corner for the given
    /// framing distance: position `(d, d*0.8, d)`, target at the origin
    pub fn framed(distance: f32) -> Self {
        Self {
            state: CameraState {
                position: Vec3::new(distance, distance * 0.8, distance),
                target: Vec3::ZERO,
                up: Vec3::Y,
            },
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn target(&self) -> Vec3 {
        self.state.target
    }

    pub fn up(&self) -> Vec3 {
        self.state.up
    }

    /// Current distance from the camera to the orbit pivot
    pub fn distance(&self) -> f32 {
        (self.state.position - self.state.target).length()
    }

    /// View matrix for the downstream renderer collaborator
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.state.position, self.state.target, self.state.up)
    }

    /// Apply one navigation command
    pub fn apply(&mut self, command: CameraCommand) {
        match command {
            CameraCommand::ZoomIn => self.zoom_in(),
            CameraCommand::ZoomOut => self.zoom_out(),
            CameraCommand::RotateLeft => self.rotate_left(),
            CameraCommand::RotateRight => self.rotate_right(),
            CameraCommand::TopView => self.top_view(),
            CameraCommand::BottomView => self.bottom_view(),
        }
    }

    /// Move toward the target by 20% of the current distance. A no-op once
    /// the camera is within the minimum epsilon, so the distance can never
    /// reach zero.
    pub fn zoom_in(&mut self) {
        let offset = self.state.position - self.state.target;
        if offset.length() <= MIN_DISTANCE {
            return;
        }
        self.state.position = self.state.target + offset * (1.0 - ZOOM_STEP);
    }

    /// Move away from the target by 20% of the current distance
    pub fn zoom_out(&mut self) {
        let offset = self.state.position - self.state.target;
        self.state.position = self.state.target + offset * (1.0 + ZOOM_STEP);
    }

    pub fn rotate_left(&mut self) {
        self.rotate_around_target(ROTATE_STEP);
    }

    pub fn rotate_right(&mut self) {
        self.rotate_around_target(-ROTATE_STEP);
    }

    /// Relocate directly above the target, preserving the current distance
    pub fn top_view(&mut self) {
        let distance = self.distance();
        self.state.position = self.state.target + Vec3::Y * distance;
    }

    /// Relocate directly below the target, preserving the current distance
    pub fn bottom_view(&mut self) {
        let distance = self.distance();
        self.state.position = self.state.target - Vec3::Y * distance;
    }

    /// Pure rotation of the position offset around the vertical axis
    /// through the target; distance-to-target is preserved
    fn rotate_around_target(&mut self, angle: f32) {
        let offset = self.state.position - self.state.target;
        let rotated = Quat::from_rotation_y(angle) * offset;
        self.state.position = self.state.target + rotated;
    }
}
