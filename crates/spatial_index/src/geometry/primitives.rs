//! Ray, plane, and triangle primitives
//!
//! Value types used by picking and the octree's ray queries.

use super::{is_finite, GeometryError};
use crate::foundation::math::Vec3;

/// A ray for ray casting and picking
///
/// The direction need not be normalized; routines normalize where the
/// parametric distance matters. `length` bounds the ray: infinite rays use
/// `f32::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The start point of the ray in world space
    pub start: Vec3,

    /// The direction of the ray
    pub direction: Vec3,

    /// Maximum parametric distance along the normalized direction
    pub length: f32,
}

impl Ray {
    /// Create an infinite ray, validating start and direction
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the start is non-finite or the
    /// direction is non-finite or zero.
    pub fn new(start: Vec3, direction: Vec3) -> Result<Self, GeometryError> {
        Self::with_length(start, direction, f32::INFINITY)
    }

    /// Create a length-bounded ray
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the inputs would not pass
    /// [`Ray::is_sensible`].
    pub fn with_length(start: Vec3, direction: Vec3, length: f32) -> Result<Self, GeometryError> {
        if !is_finite(&start) {
            return Err(GeometryError::NonFinite("ray start"));
        }
        if !is_finite(&direction) {
            return Err(GeometryError::NonFinite("ray direction"));
        }
        if direction.magnitude_squared() == 0.0 {
            return Err(GeometryError::Degenerate("ray direction"));
        }
        if !(length > 0.0) {
            return Err(GeometryError::NonPositive("ray length"));
        }
        Ok(Self {
            start,
            direction,
            length,
        })
    }

    /// Get a point along the ray at parametric distance `t` (along the
    /// normalized direction)
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start + self.direction.normalize() * t
    }

    /// Whether the ray is finite-valued with a usable direction and a
    /// positive length
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        is_finite(&self.start)
            && is_finite(&self.direction)
            && self.direction.magnitude_squared() > 0.0
            && self.length > 0.0
    }
}

/// A plane defined by a point on it and its normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Any point lying on the plane
    pub point_on_plane: Vec3,

    /// Plane normal (need not be normalized)
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane, validating point and normal
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the point is non-finite or the normal
    /// is non-finite or zero.
    pub fn new(point_on_plane: Vec3, normal: Vec3) -> Result<Self, GeometryError> {
        if !is_finite(&point_on_plane) {
            return Err(GeometryError::NonFinite("plane point"));
        }
        if !is_finite(&normal) {
            return Err(GeometryError::NonFinite("plane normal"));
        }
        if normal.magnitude_squared() == 0.0 {
            return Err(GeometryError::Degenerate("plane normal"));
        }
        Ok(Self {
            point_on_plane,
            normal,
        })
    }

    /// Whether the plane is finite-valued with a usable normal
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        is_finite(&self.point_on_plane)
            && is_finite(&self.normal)
            && self.normal.magnitude_squared() > 0.0
    }
}

/// A triangle with non-zero area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaTriangle {
    /// The three triangle vertices
    pub points: [Vec3; 3],
}

impl AreaTriangle {
    /// Create a triangle, validating non-degeneracy
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if any vertex is non-finite or the
    /// vertices are collinear.
    pub fn new(points: [Vec3; 3]) -> Result<Self, GeometryError> {
        let triangle = Self { points };
        if points.iter().any(|p| !is_finite(p)) {
            return Err(GeometryError::NonFinite("triangle vertex"));
        }
        if !triangle.is_sensible() {
            return Err(GeometryError::Degenerate("triangle"));
        }
        Ok(triangle)
    }

    /// The (unnormalized) triangle normal
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        (self.points[2] - self.points[0]).cross(&(self.points[1] - self.points[0]))
    }

    /// Whether the triangle is finite-valued with non-zero area
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        self.points.iter().all(is_finite) && self.normal().magnitude_squared() > 0.0
    }
}
