//! Canonical bounding volume shapes
//!
//! Each volume can produce the 8 corners of its local axis-aligned
//! bounding box, which is the input to the oriented-bounds pipeline in
//! [`crate::bounds`].

use serde::{Deserialize, Serialize};

use super::{is_finite, GeometryError};
use crate::foundation::math::Vec3;

/// Number of corners of a box
pub const CORNER_COUNT: usize = 8;

// Corner index bit layout, shared with octree octants:
// bit 0 set = right (+x), bit 1 set = top (+y), bit 2 set = front (+z).
const RIGHT: usize = 0b001;
const TOP: usize = 0b010;
const FRONT: usize = 0b100;

/// Get the per-axis sign (+1/-1) for a corner index in 0..8
#[must_use]
pub fn corner_sign(corner: usize) -> Vec3 {
    debug_assert!(corner < CORNER_COUNT);
    Vec3::new(
        if corner & RIGHT != 0 { 1.0 } else { -1.0 },
        if corner & TOP != 0 { 1.0 } else { -1.0 },
        if corner & FRONT != 0 { 1.0 } else { -1.0 },
    )
}

/// Compute the 8 corners of a box with the given dimensions, centered at
/// the origin
#[must_use]
pub fn box_corners(dimensions: Vec3) -> [Vec3; CORNER_COUNT] {
    let half = dimensions * 0.5;
    std::array::from_fn(|corner| corner_sign(corner).component_mul(&half))
}

/// An axis-aligned box volume described by its full dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBox {
    /// Full width, height, and depth of the box
    pub dimensions: Vec3,
}

impl VolumeBox {
    /// Create a box volume, validating its dimensions
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if any dimension is non-finite or not
    /// strictly positive.
    pub fn new(dimensions: Vec3) -> Result<Self, GeometryError> {
        let volume = Self { dimensions };
        if !is_finite(&dimensions) {
            return Err(GeometryError::NonFinite("box dimensions"));
        }
        if !volume.is_sensible() {
            return Err(GeometryError::NonPositive("box dimensions"));
        }
        Ok(volume)
    }

    /// Corners of the local bounding box of this volume
    #[must_use]
    pub fn local_box_corners(&self) -> [Vec3; CORNER_COUNT] {
        box_corners(self.dimensions)
    }

    /// Whether the volume is finite and has strictly positive dimensions
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        is_finite(&self.dimensions) && super::is_positive(&self.dimensions)
    }
}

/// A sphere volume described by its radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSphere {
    /// Sphere radius
    pub radius: f32,
}

impl VolumeSphere {
    /// Create a sphere volume, validating its radius
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the radius is non-finite or not
    /// strictly positive.
    pub fn new(radius: f32) -> Result<Self, GeometryError> {
        if !radius.is_finite() {
            return Err(GeometryError::NonFinite("sphere radius"));
        }
        if radius <= 0.0 {
            return Err(GeometryError::NonPositive("sphere radius"));
        }
        Ok(Self { radius })
    }

    /// Corners of the local bounding box of this volume
    #[must_use]
    pub fn local_box_corners(&self) -> [Vec3; CORNER_COUNT] {
        box_corners(Vec3::new(
            2.0 * self.radius,
            2.0 * self.radius,
            2.0 * self.radius,
        ))
    }

    /// Whether the volume is finite with a strictly positive radius
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        self.radius.is_finite() && self.radius > 0.0
    }
}

/// A capsule volume: a cylinder of the given height capped by hemispheres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeCapsule {
    /// Height of the cylindrical section (excluding caps)
    pub height: f32,

    /// Radius of the cylinder and both caps
    pub radius: f32,
}

impl VolumeCapsule {
    /// Create a capsule volume, validating height and radius
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if height or radius are non-finite or not
    /// strictly positive.
    pub fn new(height: f32, radius: f32) -> Result<Self, GeometryError> {
        if !height.is_finite() || !radius.is_finite() {
            return Err(GeometryError::NonFinite("capsule height or radius"));
        }
        if height <= 0.0 || radius <= 0.0 {
            return Err(GeometryError::NonPositive("capsule height or radius"));
        }
        Ok(Self { height, radius })
    }

    /// Corners of the local bounding box of this volume
    ///
    /// The box spans the full capsule, caps included.
    #[must_use]
    pub fn local_box_corners(&self) -> [Vec3; CORNER_COUNT] {
        box_corners(Vec3::new(
            2.0 * self.radius,
            self.height + 2.0 * self.radius,
            2.0 * self.radius,
        ))
    }

    /// Whether the volume is finite with strictly positive parameters
    #[must_use]
    pub fn is_sensible(&self) -> bool {
        self.height.is_finite()
            && self.height > 0.0
            && self.radius.is_finite()
            && self.radius > 0.0
    }
}
