//! Axis-aligned bounding boxes

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box over scene geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// A degenerate box containing exactly one point
    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Expand the box to contain the given point
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// The largest of the box's width/height/depth
    pub fn max_dim(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_tracks_min_and_max() {
        let mut aabb = Aabb::from_point(Vec3::new(1.0, 2.0, 3.0));
        aabb.grow(Vec3::new(-1.0, 5.0, 0.0));
        assert_eq!(aabb.min, Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 3.0));
        assert_eq!(aabb.center(), Vec3::new(0.0, 3.5, 1.5));
        assert_eq!(aabb.max_dim(), 3.0);
    }

    #[test]
    fn point_box_is_degenerate() {
        let aabb = Aabb::from_point(Vec3::splat(4.0));
        assert_eq!(aabb.size(), Vec3::ZERO);
        assert_eq!(aabb.max_dim(), 0.0);
    }
}
