//! Math utilities and types
//!
//! Provides fundamental math types for 3D spatial queries.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
///
/// The scene graph's transform propagation stage is expected to have
/// combined parent transforms already; the spatial system only ever reads
/// the final world matrix via [`Transform::to_matrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a transform from a transformation matrix
    #[must_use]
    pub fn from_matrix(matrix: &Mat4) -> Self {
        // Extract position
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        // Extract scale from the matrix columns
        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        // Extract rotation by removing scale from the rotation matrix
        let rotation_matrix = Matrix3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_matrix_round_trip() {
        let transform = Transform {
            position: Vec3::new(1.0, -2.0, 3.0),
            rotation: Quat::from_euler_angles(0.3, -0.2, 0.9),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };

        let recovered = Transform::from_matrix(&transform.to_matrix());
        assert_relative_eq!(recovered.position, transform.position, epsilon = 1e-5);
        assert_relative_eq!(recovered.scale, transform.scale, epsilon = 1e-5);
        assert_relative_eq!(
            recovered.rotation.angle_to(&transform.rotation),
            0.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_transform_point_through_matrix() {
        let transform = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
        let moved = transform.to_matrix().transform_point(&Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(moved.coords, Vec3::new(11.0, 2.0, 3.0), epsilon = 1e-6);
    }
}
