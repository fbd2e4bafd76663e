//! Axis-aligned bounding box
//!
//! The conservative world-space bound every spatial query operates on.

use std::ops::Add;

use crate::foundation::math::Vec3;
use crate::geometry::{corner_sign, AreaTriangle, GeometryError, CORNER_COUNT};

use super::ObjectBounds;

// Corner index bits, matching `geometry::corner_sign`.
const RIGHT: usize = 0b001;
const TOP: usize = 0b010;
const FRONT: usize = 0b100;

/// Axis-Aligned Bounding Box for spatial queries
///
/// Invariant: `max >= min` componentwise. The cheap constructors debug
/// assert it; [`Aabb::try_new`] validates it for untrusted extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum (left-bottom-back) corner of the bounding box
    pub min: Vec3,
    /// Maximum (right-top-front) corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(
            max.x >= min.x && max.y >= min.y && max.z >= min.z,
            "AABB maximum must not be less than minimum on any axis"
        );
        Self { min, max }
    }

    /// Create a new AABB from min and max corners, validating the extents
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if a corner is non-finite or the max/min
    /// invariant does not hold.
    pub fn try_new(min: Vec3, max: Vec3) -> Result<Self, GeometryError> {
        if !crate::geometry::is_finite(&min) || !crate::geometry::is_finite(&max) {
            return Err(GeometryError::NonFinite("AABB extents"));
        }
        if max.x < min.x || max.y < min.y || max.z < min.z {
            return Err(GeometryError::InvalidExtents);
        }
        Ok(Self { min, max })
    }

    /// Create an AABB centered at a point with the given full dimensions
    #[must_use]
    pub fn from_center_dimensions(center: Vec3, dimensions: Vec3) -> Self {
        let half = dimensions * 0.5;
        Self::new(center - half, center + half)
    }

    /// Get the center of the AABB
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full dimensions (width, height, depth) of the AABB
    #[must_use]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the extents (half-size) of the AABB
    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.dimensions() * 0.5
    }

    /// Whether both corners are finite
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        crate::geometry::is_finite(&self.min) && crate::geometry::is_finite(&self.max)
    }

    /// The 8 corners of the box, indexed by the RIGHT/TOP/FRONT corner bits
    #[must_use]
    pub fn corners(&self) -> [Vec3; CORNER_COUNT] {
        std::array::from_fn(|corner| {
            let sign = corner_sign(corner);
            Vec3::new(
                if sign.x > 0.0 { self.max.x } else { self.min.x },
                if sign.y > 0.0 { self.max.y } else { self.min.y },
                if sign.z > 0.0 { self.max.z } else { self.min.z },
            )
        })
    }

    /// Decompose the box into its 12 face triangles, two per face
    #[must_use]
    pub fn face_triangles(&self) -> [AreaTriangle; 12] {
        let c = self.corners();
        let tri = |a: usize, b: usize, d: usize| AreaTriangle {
            points: [c[a], c[b], c[d]],
        };
        [
            // left face
            tri(0, FRONT, FRONT | TOP),
            tri(0, FRONT | TOP, TOP),
            // right face
            tri(RIGHT | FRONT, RIGHT, RIGHT | TOP),
            tri(RIGHT | FRONT, RIGHT | TOP, RIGHT | TOP | FRONT),
            // bottom face
            tri(RIGHT | FRONT, FRONT, 0),
            tri(RIGHT | FRONT, 0, RIGHT),
            // top face
            tri(TOP, RIGHT | TOP, RIGHT | TOP | FRONT),
            tri(TOP, RIGHT | TOP | FRONT, TOP | FRONT),
            // back face
            tri(0, RIGHT, RIGHT | TOP),
            tri(0, RIGHT | TOP, TOP),
            // front face
            tri(RIGHT | FRONT, FRONT, TOP | FRONT),
            tri(RIGHT | FRONT, TOP | FRONT, RIGHT | TOP | FRONT),
        ]
    }

    /// Check if this AABB contains a point (boundary inclusive)
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
            && point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB fully contains another (boundary inclusive)
    #[must_use]
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
            && self.min.y <= other.min.y && self.max.y >= other.max.y
            && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Check if this AABB intersects another
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// `ray_dir` must be normalized if the returned entry distance is to
    /// be meaningful. Returns the distance to the entry point, or 0 if the
    /// origin is inside the box; `None` if the ray misses.
    ///
    /// Boundary inclusive: an axis-parallel ray grazing a face counts as a
    /// hit. Axes with a zero direction component are decided by a range
    /// check on the origin, never by a `0 * inf` slab product.
    #[must_use]
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let mut t_entry = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray_origin[axis];
            let direction = ray_dir[axis];
            if direction == 0.0 {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let t1 = (self.min[axis] - origin) * inv;
            let t2 = (self.max[axis] - origin) * inv;
            t_entry = t_entry.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        // Ray intersects if the exit is not before the entry nor behind
        // the origin
        if t_exit >= t_entry && t_exit >= 0.0 {
            Some(t_entry.max(0.0))
        } else {
            None
        }
    }
}

impl Add for Aabb {
    type Output = Aabb;

    /// Union of two boxes: the smallest AABB containing both
    fn add(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

impl From<&ObjectBounds> for Aabb {
    /// Conservative world bound: the componentwise min/max over the 8
    /// world-oriented corners. Rotated shapes are not re-fit minimally.
    fn from(object_bounds: &ObjectBounds) -> Self {
        let mut min = Vec3::from_element(f32::INFINITY);
        let mut max = Vec3::from_element(f32::NEG_INFINITY);
        for corner in object_bounds.world_oriented_corners() {
            min = min.inf(&corner);
            max = max.sup(&corner);
        }
        Self::new(min, max)
    }
}
