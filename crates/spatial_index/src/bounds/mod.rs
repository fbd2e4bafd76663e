//! Bounds model: oriented object bounds and derived world-space AABBs
//!
//! Bounds-producing collaborators (mesh- or light-derived) fill an
//! [`ObjectBounds`] with a local volume and placement offset; once the
//! scene graph has finalized world matrices for the tick, the volume's
//! oriented corners are reduced to a conservative [`Aabb`] that feeds the
//! octree.

mod aabb;
mod object_bounds;

pub use aabb::Aabb;
pub use object_bounds::{ObjectBounds, TrueVolume};
