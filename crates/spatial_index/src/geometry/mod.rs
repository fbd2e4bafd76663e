//! Geometric primitives and intersection predicates
//!
//! Value types for rays, planes, triangles, and bounding volumes, plus the
//! intersection/overlap/containment routines the octree is built on.
//!
//! Every primitive carries an `is_sensible()` validity predicate (finite,
//! non-degenerate). Handing an insensible primitive to a predicate is a
//! programmer error; the checked constructors are the supported way to
//! build primitives from untrusted data.

mod intersect;
mod primitives;
mod volume;

pub use intersect::{
    ray_aabb_intersections, ray_overlaps_aabb, ray_plane_intersection, ray_triangle_intersection,
};
pub use primitives::{AreaTriangle, Plane, Ray};
pub use volume::{box_corners, corner_sign, VolumeBox, VolumeCapsule, VolumeSphere, CORNER_COUNT};

use crate::foundation::math::Vec3;

/// Errors raised when constructing geometric primitives from invalid data
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// A coordinate was NaN or infinite where a finite value is required
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    /// A direction, normal, or area degenerated to zero
    #[error("degenerate {0}")]
    Degenerate(&'static str),

    /// A dimension that must be strictly positive was not
    #[error("non-positive {0}")]
    NonPositive(&'static str),

    /// An extents pair violated the max >= min invariant
    #[error("extents maximum is less than minimum on at least one axis")]
    InvalidExtents,
}

/// Check that every component of a vector is finite
#[must_use]
pub fn is_finite(vector: &Vec3) -> bool {
    vector.x.is_finite() && vector.y.is_finite() && vector.z.is_finite()
}

/// Check that every component of a vector is strictly positive
#[must_use]
pub fn is_positive(vector: &Vec3) -> bool {
    vector.x > 0.0 && vector.y > 0.0 && vector.z > 0.0
}
