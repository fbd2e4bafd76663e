//! Oriented object bounds
//!
//! The "true volume" of an entity plus its object-space placement, and
//! the world placement computed from the entity's final model matrix.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat3, Mat4, Quat, Vec3};
use crate::geometry::{VolumeBox, VolumeCapsule, VolumeSphere, CORNER_COUNT};

/// The canonical shape bounding an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "volume_type", rename_all = "snake_case")]
pub enum TrueVolume {
    /// An oriented box
    Box(VolumeBox),
    /// A sphere
    Sphere(VolumeSphere),
    /// A capsule
    Capsule(VolumeCapsule),
}

impl TrueVolume {
    /// Corners of the volume's local axis-aligned bounding box
    #[must_use]
    pub fn local_box_corners(&self) -> [Vec3; CORNER_COUNT] {
        match self {
            Self::Box(volume) => volume.local_box_corners(),
            Self::Sphere(volume) => volume.local_box_corners(),
            Self::Capsule(volume) => volume.local_box_corners(),
        }
    }

    /// Whether the underlying volume passes its validity predicate
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        match self {
            Self::Box(volume) => volume.is_sensible(),
            Self::Sphere(volume) => volume.is_sensible(),
            Self::Capsule(volume) => volume.is_sensible(),
        }
    }
}

/// Oriented bounding volume of a spatially indexed entity
///
/// Created once per entity by a bounds-producing collaborator and mutated
/// whenever the source geometry or transform changes. The octree never
/// mutates it; the spatial system recomputes the world placement via
/// [`ObjectBounds::apply_model_matrix`] each time the entity's transform
/// settles for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectBounds {
    /// The true volume bounding the entity
    #[serde(flatten)]
    pub volume: TrueVolume,

    /// Object-space position of the volume relative to the entity origin
    pub position_offset: Vec3,

    /// Object-space orientation of the volume
    pub orientation_offset: Quat,

    /// Computed world position; filled by `apply_model_matrix`
    #[serde(skip, default = "Vec3::zeros")]
    world_position: Vec3,

    /// Computed world orientation; filled by `apply_model_matrix`
    #[serde(skip, default = "Quat::identity")]
    world_orientation: Quat,
}

impl ObjectBounds {
    /// Create bounds from a box volume
    #[must_use]
    pub fn from_box(volume: VolumeBox, position_offset: Vec3, orientation_offset: Quat) -> Self {
        Self::from_volume(TrueVolume::Box(volume), position_offset, orientation_offset)
    }

    /// Create bounds from a sphere volume
    #[must_use]
    pub fn from_sphere(
        volume: VolumeSphere,
        position_offset: Vec3,
        orientation_offset: Quat,
    ) -> Self {
        Self::from_volume(TrueVolume::Sphere(volume), position_offset, orientation_offset)
    }

    /// Create bounds from a capsule volume
    #[must_use]
    pub fn from_capsule(
        volume: VolumeCapsule,
        position_offset: Vec3,
        orientation_offset: Quat,
    ) -> Self {
        Self::from_volume(TrueVolume::Capsule(volume), position_offset, orientation_offset)
    }

    /// Create bounds from any volume
    #[must_use]
    pub fn from_volume(
        volume: TrueVolume,
        position_offset: Vec3,
        orientation_offset: Quat,
    ) -> Self {
        Self {
            volume,
            position_offset,
            orientation_offset,
            world_position: Vec3::zeros(),
            world_orientation: Quat::identity(),
        }
    }

    /// Recompute the world placement from the entity's final model matrix
    ///
    /// The world position is the matrix applied to the origin; the world
    /// orientation is the rotation extracted from the matrix's normal
    /// transform (transpose of the inverse), which makes it independent of
    /// scale. Shear is ignored.
    pub fn apply_model_matrix(&mut self, model_matrix: &Mat4) {
        self.world_position = Vec3::new(model_matrix.m14, model_matrix.m24, model_matrix.m34);

        let linear = Mat3::new(
            model_matrix.m11, model_matrix.m12, model_matrix.m13,
            model_matrix.m21, model_matrix.m22, model_matrix.m23,
            model_matrix.m31, model_matrix.m32, model_matrix.m33,
        );
        let normal_matrix = linear
            .try_inverse()
            .map_or_else(Mat3::identity, |inverse| inverse.transpose());
        self.world_orientation = Quat::from_matrix(&normal_matrix);
    }

    /// The computed world position of the volume center
    #[must_use]
    pub fn computed_world_position(&self) -> Vec3 {
        self.world_position + self.world_orientation * self.position_offset
    }

    /// The computed world orientation of the volume
    #[must_use]
    pub fn computed_world_orientation(&self) -> Quat {
        self.world_orientation * self.orientation_offset
    }

    /// Corners of the volume's local bounding box, volume-relative
    #[must_use]
    pub fn volume_relative_corners(&self) -> [Vec3; CORNER_COUNT] {
        self.volume.local_box_corners()
    }

    /// Corners placed in the entity's object space: offset, then rotated
    /// by the local orientation offset
    #[must_use]
    pub fn local_oriented_corners(&self) -> [Vec3; CORNER_COUNT] {
        let mut corners = self.volume_relative_corners();
        for corner in &mut corners {
            *corner = self.position_offset + self.orientation_offset * *corner;
        }
        corners
    }

    /// Corners placed in world space: object-space corners rotated by the
    /// world orientation and translated by the world position
    #[must_use]
    pub fn world_oriented_corners(&self) -> [Vec3; CORNER_COUNT] {
        let mut corners = self.local_oriented_corners();
        for corner in &mut corners {
            *corner = self.world_position + self.world_orientation * *corner;
        }
        corners
    }

    /// Whether the underlying volume and offsets are valid
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        self.volume.is_sensible() && crate::geometry::is_finite(&self.position_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Aabb;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    fn unit_box_bounds() -> ObjectBounds {
        ObjectBounds::from_box(
            VolumeBox::new(Vec3::new(2.0, 2.0, 2.0)).unwrap(),
            Vec3::zeros(),
            Quat::identity(),
        )
    }

    #[test]
    fn test_world_position_from_matrix_translation() {
        let mut bounds = unit_box_bounds();
        let transform = Transform::from_position(Vec3::new(3.0, -1.0, 7.0));
        bounds.apply_model_matrix(&transform.to_matrix());
        assert_relative_eq!(
            bounds.computed_world_position(),
            Vec3::new(3.0, -1.0, 7.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_world_orientation_ignores_scale() {
        let mut bounds = unit_box_bounds();
        let rotation = Quat::from_euler_angles(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let transform = Transform {
            position: Vec3::zeros(),
            rotation,
            scale: Vec3::new(5.0, 5.0, 5.0),
        };
        bounds.apply_model_matrix(&transform.to_matrix());
        assert_relative_eq!(
            bounds.computed_world_orientation().angle_to(&rotation),
            0.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_derived_aabb_contains_all_world_corners() {
        let mut bounds = ObjectBounds::from_box(
            VolumeBox::new(Vec3::new(2.0, 1.0, 3.0)).unwrap(),
            Vec3::new(0.5, 0.0, 0.0),
            Quat::from_euler_angles(0.4, 0.8, -0.3),
        );
        let transform = Transform {
            position: Vec3::new(-4.0, 2.0, 9.0),
            rotation: Quat::from_euler_angles(1.0, 0.2, 0.1),
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        bounds.apply_model_matrix(&transform.to_matrix());

        let aabb = Aabb::from(&bounds);
        for corner in bounds.world_oriented_corners() {
            // A conservative bound must contain every corner it was built
            // from; allow for float slack at the extents themselves.
            let slack = Vec3::from_element(1e-4);
            let loose = Aabb::new(aabb.min - slack, aabb.max + slack);
            assert!(loose.contains_point(corner));
        }
    }

    #[test]
    fn test_rotated_box_bound_is_loose() {
        let mut bounds = unit_box_bounds();
        // 45 degrees about Y widens the conservative bound beyond the box.
        let transform = Transform {
            position: Vec3::zeros(),
            rotation: Quat::from_euler_angles(0.0, std::f32::consts::FRAC_PI_4, 0.0),
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        bounds.apply_model_matrix(&transform.to_matrix());
        let aabb = Aabb::from(&bounds);
        assert!(aabb.dimensions().x > 2.0);
        assert_relative_eq!(aabb.dimensions().y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_offset_volume_shifts_bound() {
        let bounds = ObjectBounds::from_box(
            VolumeBox::new(Vec3::new(2.0, 2.0, 2.0)).unwrap(),
            Vec3::new(10.0, 0.0, 0.0),
            Quat::identity(),
        );
        // No model matrix applied yet: world placement is identity.
        let aabb = Aabb::from(&bounds);
        assert_relative_eq!(aabb.center(), Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-6);
    }
}
