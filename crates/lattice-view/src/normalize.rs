//! One-shot scene normalization and initial camera framing

use lattice_core::{Aabb, Scene};
use tracing::debug;

use crate::camera::OrbitCamera;

/// Framing distance as a multiple of the largest bounding-box extent
pub const DISTANCE_FACTOR: f32 = 2.5;

/// Framing distance for scenes with zero extent (empty or a single point),
/// so the view direction is never zero-length
pub const FALLBACK_DISTANCE: f32 = 5.0;

/// Result of normalizing a scene: the derived camera and the recentered
/// bounds (`None` for a scene with no vertices)
#[derive(Debug, Clone, Copy)]
pub struct Framing {
    pub camera: OrbitCamera,
    pub bounds: Option<Aabb>,
}

/// Recenter the scene on the origin and derive its initial camera framing.
///
/// Computes the axis-aligned bounds over every vertex of every mesh and
/// translates the whole scene by the negative of the box center, in one
/// destructive pass. Runs exactly once per load, before the first camera
/// frame; the session enforces that ordering.
pub fn normalize(scene: &mut Scene) -> Framing {
    let Some(bounds) = scene.bounds() else {
        debug!("normalizing empty scene, using fallback framing");
        return Framing {
            camera: OrbitCamera::framed(FALLBACK_DISTANCE),
            bounds: None,
        };
    };

    let center = bounds.center();
    scene.translate(-center);

    let max_dim = bounds.max_dim();
    let distance = if max_dim > 0.0 {
        max_dim * DISTANCE_FACTOR
    } else {
        FALLBACK_DISTANCE
    };

    debug!(
        max_dim,
        distance,
        meshes = scene.meshes.len(),
        "normalized scene to origin"
    );

    Framing {
        camera: OrbitCamera::framed(distance),
        bounds: Some(Aabb {
            min: bounds.min - center,
            max: bounds.max - center,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lattice_core::Mesh;

    const EPSILON: f32 = 1e-4;

    fn scene_with_positions(positions: Vec<Vec3>) -> Scene {
        let mut mesh = Mesh::new("test");
        mesh.positions = positions;
        Scene { meshes: vec![mesh] }
    }

    #[test]
    fn recenters_bounding_box_on_origin() {
        let mut scene = scene_with_positions(vec![
            Vec3::new(2.0, 2.0, 2.0),
            Vec3::new(4.0, 6.0, 2.0),
            Vec3::new(4.0, 2.0, 8.0),
        ]);
        let framing = normalize(&mut scene);

        let bounds = scene.bounds().unwrap();
        assert!(bounds.center().length() < EPSILON);
        assert_eq!(framing.bounds.unwrap().center(), bounds.center());

        // max_dim is the depth (6.0) here, so the framing distance is 15.
        assert_eq!(framing.camera.position(), Vec3::new(15.0, 12.0, 15.0));
        assert!(framing.camera.distance() > 0.0);
    }

    #[test]
    fn translation_is_applied_to_every_mesh() {
        let mut scene = scene_with_positions(vec![Vec3::new(10.0, 0.0, 0.0)]);
        let mut other = Mesh::new("other");
        other.positions = vec![Vec3::new(12.0, 0.0, 0.0)];
        scene.meshes.push(other);

        normalize(&mut scene);
        assert!((scene.meshes[0].positions[0] - Vec3::new(-1.0, 0.0, 0.0)).length() < EPSILON);
        assert!((scene.meshes[1].positions[0] - Vec3::new(1.0, 0.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn single_point_falls_back_to_fixed_distance() {
        let mut scene = scene_with_positions(vec![Vec3::new(3.0, 3.0, 3.0)]);
        let framing = normalize(&mut scene);

        // The point is moved to the origin and the fallback framing keeps
        // a non-degenerate view direction.
        assert!(scene.meshes[0].positions[0].length() < EPSILON);
        assert_eq!(
            framing.camera.position(),
            Vec3::new(
                FALLBACK_DISTANCE,
                FALLBACK_DISTANCE * 0.8,
                FALLBACK_DISTANCE
            )
        );
        assert!(framing.camera.distance() > 0.0);
    }

    #[test]
    fn empty_scene_falls_back_to_fixed_distance() {
        let mut scene = Scene::new();
        let framing = normalize(&mut scene);
        assert!(framing.bounds.is_none());
        assert!(framing.camera.distance() > 0.0);
    }
}
