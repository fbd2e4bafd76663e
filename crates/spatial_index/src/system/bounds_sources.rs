//! Bounds-producing collaborators
//!
//! Helpers that derive an [`ObjectBounds`] from the scene data an entity
//! actually carries: mesh vertices, or the emission reach of a light.

use crate::bounds::ObjectBounds;
use crate::foundation::math::{Quat, Vec3};
use crate::geometry::{GeometryError, VolumeBox, VolumeSphere};

/// Flat meshes still need a valid box; clamp each dimension to this floor.
const MIN_BOX_DIMENSION: f32 = 1e-4;

/// Spatial reach of a light source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightEmission {
    /// Omnidirectional light reaching `radius` units
    Point {
        /// Emission radius
        radius: f32,
    },
    /// Cone light; indexed by its reach, ignoring the cone shape
    Spot {
        /// Emission radius
        radius: f32,
    },
    /// Unbounded scene-wide light
    Directional,
}

/// Bounds of a mesh: the box over its vertex positions, offset to the
/// vertex centroid of that box
///
/// # Errors
///
/// Returns [`GeometryError`] for an empty vertex list or non-finite
/// positions.
pub fn mesh_bounds(vertices: &[Vec3]) -> Result<ObjectBounds, GeometryError> {
    if vertices.is_empty() {
        return Err(GeometryError::Degenerate("mesh vertex list"));
    }
    let mut min = Vec3::from_element(f32::INFINITY);
    let mut max = Vec3::from_element(f32::NEG_INFINITY);
    for vertex in vertices {
        if !crate::geometry::is_finite(vertex) {
            return Err(GeometryError::NonFinite("mesh vertex position"));
        }
        min = min.inf(vertex);
        max = max.sup(vertex);
    }

    let dimensions = (max - min).sup(&Vec3::from_element(MIN_BOX_DIMENSION));
    let center = (min + max) * 0.5;
    Ok(ObjectBounds::from_box(
        VolumeBox::new(dimensions)?,
        center,
        Quat::identity(),
    ))
}

/// Bounds of a light's emission, or `None` when the light is unbounded or
/// unreachable and therefore not spatially indexed
#[must_use]
pub fn light_bounds(emission: &LightEmission) -> Option<ObjectBounds> {
    match emission {
        LightEmission::Point { radius } | LightEmission::Spot { radius } => {
            let sphere = VolumeSphere::new(*radius).ok()?;
            Some(ObjectBounds::from_sphere(
                sphere,
                Vec3::zeros(),
                Quat::identity(),
            ))
        }
        LightEmission::Directional => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{Aabb, TrueVolume};
    use approx::assert_relative_eq;

    #[test]
    fn test_mesh_bounds_cover_all_vertices() {
        let vertices = [
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, -2.0, 0.5),
            Vec3::new(0.0, 1.0, -4.0),
        ];
        let bounds = mesh_bounds(&vertices).unwrap();
        let aabb = Aabb::from(&bounds);
        for vertex in vertices {
            assert!(aabb.contains_point(vertex));
        }
        assert_relative_eq!(aabb.center(), Vec3::new(1.0, -0.5, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_flat_mesh_still_produces_valid_box() {
        let vertices = [Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0)];
        let bounds = mesh_bounds(&vertices).unwrap();
        assert!(bounds.is_sensible());
    }

    #[test]
    fn test_mesh_bounds_rejects_bad_input() {
        assert!(mesh_bounds(&[]).is_err());
        assert!(mesh_bounds(&[Vec3::new(f32::NAN, 0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_light_bounds() {
        let point = light_bounds(&LightEmission::Point { radius: 5.0 }).unwrap();
        assert!(matches!(point.volume, TrueVolume::Sphere(_)));
        let aabb = Aabb::from(&point);
        assert_relative_eq!(aabb.dimensions(), Vec3::from_element(10.0), epsilon = 1e-5);

        assert!(light_bounds(&LightEmission::Spot { radius: 2.0 }).is_some());
        assert!(light_bounds(&LightEmission::Directional).is_none());
        assert!(light_bounds(&LightEmission::Point { radius: 0.0 }).is_none());
    }
}
