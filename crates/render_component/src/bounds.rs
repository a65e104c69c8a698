//! Local-space axis-aligned bounding boxes
//!
//! Every renderable keeps a box in its own local frame. Parent transforms never
//! move it; converting to world space is done on demand (see
//! [`BoundingBox::transformed`]) by whoever needs it, e.g. picking.

use crate::foundation::math::{Mat4, Point3, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned extent of an object's geometry in its local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum X
    pub xmin: f32,
    /// Maximum X
    pub xmax: f32,
    /// Minimum Y
    pub ymin: f32,
    /// Maximum Y
    pub ymax: f32,
    /// Minimum Z
    pub zmin: f32,
    /// Maximum Z
    pub zmax: f32,
}

impl Default for BoundingBox {
    /// The box a renderable reports before its geometry is known: [-1, 1] on every axis.
    fn default() -> Self {
        Self {
            xmin: -1.0,
            xmax: 1.0,
            ymin: -1.0,
            ymax: 1.0,
            zmin: -1.0,
            zmax: 1.0,
        }
    }
}

impl BoundingBox {
    /// Create a box from its min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            xmin: min.x,
            xmax: max.x,
            ymin: min.y,
            ymax: max.y,
            zmin: min.z,
            zmax: max.z,
        }
    }

    /// Box enclosing every position. Returns the default box for empty input.
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        let Some((first, rest)) = positions.split_first() else {
            return Self::default();
        };
        let mut bb = Self::new(Vec3::from(*first), Vec3::from(*first));
        for p in rest {
            bb.expand_to(Vec3::from(*p));
        }
        bb
    }

    /// Box enclosing a flat `x, y, z, x, y, z, ...` array. Trailing values that
    /// do not form a full triple are ignored.
    pub fn from_flat(data: &[f32]) -> Self {
        let positions: Vec<[f32; 3]> = data
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self::from_positions(&positions)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.xmin, self.ymin, self.zmin)
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.xmax, self.ymax, self.zmax)
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max() - self.min()) * 0.5
    }

    /// True when min <= max on every axis
    pub fn is_valid(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax && self.zmin <= self.zmax
    }

    /// Grow the box so it contains `point`
    pub fn expand_to(&mut self, point: Vec3) {
        self.xmin = self.xmin.min(point.x);
        self.xmax = self.xmax.max(point.x);
        self.ymin = self.ymin.min(point.y);
        self.ymax = self.ymax.max(point.y);
        self.zmin = self.zmin.min(point.z);
        self.zmax = self.zmax.max(point.z);
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            xmin: self.xmin.min(other.xmin),
            xmax: self.xmax.max(other.xmax),
            ymin: self.ymin.min(other.ymin),
            ymax: self.ymax.max(other.ymax),
            zmin: self.zmin.min(other.zmin),
            zmax: self.zmax.max(other.zmax),
        }
    }

    /// Check if this box contains a point (boundary inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.xmin && point.x <= self.xmax &&
        point.y >= self.ymin && point.y <= self.ymax &&
        point.z >= self.zmin && point.z <= self.zmax
    }

    /// Check if this box intersects another box
    pub fn intersects(&self, other: &Self) -> bool {
        self.xmin <= other.xmax && self.xmax >= other.xmin &&
        self.ymin <= other.ymax && self.ymax >= other.ymin &&
        self.zmin <= other.zmax && self.zmax >= other.zmin
    }

    /// Axis-aligned box enclosing this box after applying `matrix` to its corners
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut corners = [[0.0_f32; 3]; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let x = if i & 1 == 0 { self.xmin } else { self.xmax };
            let y = if i & 2 == 0 { self.ymin } else { self.ymax };
            let z = if i & 4 == 0 { self.zmin } else { self.zmax };
            let p = matrix.transform_point(&Point3::new(x, y, z));
            *corner = [p.x, p.y, p.z];
        }
        Self::from_positions(&corners)
    }

    /// Test ray intersection with this box using the slab method.
    /// Returns the distance to the entry point (0 if the origin is inside).
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x != 0.0 { 1.0 / ray_dir.x } else { f32::INFINITY },
            if ray_dir.y != 0.0 { 1.0 / ray_dir.y } else { f32::INFINITY },
            if ray_dir.z != 0.0 { 1.0 / ray_dir.z } else { f32::INFINITY },
        );

        let t1 = (self.xmin - ray_origin.x) * inv_dir.x;
        let t2 = (self.xmax - ray_origin.x) * inv_dir.x;
        let t3 = (self.ymin - ray_origin.y) * inv_dir.y;
        let t4 = (self.ymax - ray_origin.y) * inv_dir.y;
        let t5 = (self.zmin - ray_origin.z) * inv_dir.z;
        let t6 = (self.zmax - ray_origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_positions_contains_every_vertex() {
        let positions = [
            [0.5, -2.0, 1.0],
            [-1.5, 3.0, 0.0],
            [0.0, 0.0, -4.0],
        ];
        let bb = BoundingBox::from_positions(&positions);

        assert!(bb.is_valid());
        for p in &positions {
            assert!(bb.contains_point(Vec3::from(*p)));
        }
        assert_relative_eq!(bb.xmin, -1.5);
        assert_relative_eq!(bb.ymax, 3.0);
        assert_relative_eq!(bb.zmin, -4.0);
    }

    #[test]
    fn test_empty_input_keeps_default_box() {
        assert_eq!(BoundingBox::from_positions(&[]), BoundingBox::default());
        assert_eq!(BoundingBox::from_flat(&[1.0, 2.0]), BoundingBox::default());
    }

    #[test]
    fn test_single_point_is_degenerate_but_valid() {
        let bb = BoundingBox::from_flat(&[2.0, 2.0, 2.0]);
        assert!(bb.is_valid());
        assert_relative_eq!(bb.extents().norm(), 0.0);
    }

    #[test]
    fn test_union_and_intersects() {
        let a = BoundingBox::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let b = BoundingBox::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let c = BoundingBox::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let u = a.union(&c);
        assert_relative_eq!(u.xmin, 0.0);
        assert_relative_eq!(u.zmax, 7.0);
    }

    #[test]
    fn test_transformed_follows_translation() {
        let bb = BoundingBox::default();
        let moved = bb.transformed(&Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(moved.xmin, 9.0);
        assert_relative_eq!(moved.xmax, 11.0);
        assert_relative_eq!(moved.ymin, -1.0);
    }

    #[test]
    fn test_ray_hits_and_misses() {
        let bb = BoundingBox::default();
        let hit = bb.intersect_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(hit.unwrap(), 4.0);

        let miss = bb.intersect_ray(Vec3::new(5.0, 5.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(miss.is_none());
    }
}
