//! The canonical scene representation
//!
//! Every decoder produces a `Scene` and every encoder consumes one. The
//! model is deliberately flat: a scene owns an ordered list of meshes with
//! no hierarchy, and a mesh owns struct-of-arrays vertex channels plus a
//! triangle list. Optional channels (normals, uvs, colors), when present,
//! hold exactly one entry per vertex.

use glam::{Vec2, Vec3};

use crate::bounds::Aabb;
use crate::types::Color;

/// A single flat surface material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: Color,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Color::GRAY,
            metalness: 0.25,
            roughness: 0.6,
        }
    }
}

/// One mesh: vertex channels, triangle faces, and an optional material.
///
/// Vertex identity is the positional index. A mesh is immutable once
/// decoded except for the translation applied by the normalizer.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub uvs: Option<Vec<Vec2>>,
    pub colors: Option<Vec<Color>>,
    pub faces: Vec<[u32; 3]>,
    pub material: Option<Material>,
}

impl Mesh {
    /// Create an empty mesh with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Translate every vertex position by the given offset
    pub fn translate(&mut self, offset: Vec3) {
        for position in &mut self.positions {
            *position += offset;
        }
    }
}

/// The canonical scene: a flat ordered list of meshes.
///
/// Owns all meshes and materials exclusively; decoders build a fresh scene
/// per request and drop it wholesale on failure.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total vertices across all meshes
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    /// Total triangles across all meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    /// True when no mesh carries any geometry
    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Axis-aligned bounds over every vertex of every mesh, or `None` for
    /// a scene with no vertices
    pub fn bounds(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        for mesh in &self.meshes {
            for &position in &mesh.positions {
                match bounds.as_mut() {
                    Some(aabb) => aabb.grow(position),
                    None => bounds = Some(Aabb::from_point(position)),
                }
            }
        }
        bounds
    }

    /// Translate every mesh by the given offset
    pub fn translate(&mut self, offset: Vec3) {
        for mesh in &mut self.meshes {
            mesh.translate(offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_scene() -> Scene {
        let mut mesh = Mesh::new("test");
        mesh.positions = vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(3.0, 2.0, 0.0)];
        Scene { meshes: vec![mesh] }
    }

    #[test]
    fn bounds_cover_all_meshes() {
        let mut scene = two_point_scene();
        let mut other = Mesh::new("other");
        other.positions = vec![Vec3::new(0.0, -5.0, 1.0)];
        scene.meshes.push(other);

        let bounds = scene.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -5.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn empty_scene_has_no_bounds() {
        let scene = Scene::new();
        assert!(scene.bounds().is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn translate_moves_every_vertex() {
        let mut scene = two_point_scene();
        scene.translate(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(scene.meshes[0].positions[0], Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(scene.meshes[0].positions[1], Vec3::new(4.0, 3.0, 1.0));
    }

    #[test]
    fn default_material_is_flat_gray() {
        let material = Material::default();
        assert_eq!(material.base_color, Color::GRAY);
        assert_eq!(material.metalness, 0.25);
        assert_eq!(material.roughness, 0.6);
    }
}
