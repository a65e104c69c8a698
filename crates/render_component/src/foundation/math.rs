//! Math aliases over nalgebra and the scene-graph transform

use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix, column-major as uploaded to shaders
pub type Mat4 = Matrix4<f32>;

/// 3D point
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion rotation
pub type Quat = Unit<Quaternion<f32>>;

/// Placement of a scene element relative to its parent
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Offset in the parent frame
    pub position: Vec3,
    /// Orientation in the parent frame
    pub rotation: Quat,
    /// Per-axis scale, applied first
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }
}

impl Transform {
    /// No offset, rotation or scaling
    pub fn identity() -> Self {
        Self::default()
    }

    /// Pure translation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Replace the rotation, keeping position and scale
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Replace the scale, keeping position and rotation
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// `translation * rotation * scale`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Camera matrices in OpenGL conventions
pub trait Mat4Ext {
    /// Perspective projection with clip depth in [-1, 1]; `fov_y` in radians
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed view matrix looking from `eye` at `target`
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_matrix_applies_scale_before_translation() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::new(2.0, 2.0, 2.0));
        let p = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(3.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_applies_before_translation() {
        let quarter_turn = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let transform = Transform::from_position(Vec3::new(0.0, 0.0, -1.0)).with_rotation(quarter_turn);
        let p = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 0.0, -2.0), epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y());
        let eye = view.transform_point(&Point3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(eye.coords.norm(), 0.0, epsilon = 1e-5);
    }
}
