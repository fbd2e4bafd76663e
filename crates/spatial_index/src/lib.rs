//! # Spatial Index
//!
//! The spatial indexing core of a real-time 3D scene engine: answers
//! "which entities occupy or intersect this region of space" as thousands
//! of objects move every simulation tick.
//!
//! ## Architecture
//!
//! ```text
//! geometry  (rays, planes, triangles, volumes, intersection predicates)
//!     ↓
//! bounds    (oriented ObjectBounds → conservative world-space Aabb)
//!     ↓
//! octree    (addressable sparse octree with dynamic re-rooting)
//!     ↓
//! system    (per-tick orchestrator + overlap queries)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spatial_index::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut world = World::new();
//!     let config = SpatialSystemConfig::default();
//!     let mut spatial = SpatialQuerySystem::new(&config)?;
//!
//!     let entity = world.create_entity();
//!     world.insert_component(entity, Transform::identity());
//!     world.insert_component(
//!         entity,
//!         ObjectBounds::from_box(
//!             VolumeBox::new(Vec3::new(1.0, 1.0, 1.0))?,
//!             Vec3::zeros(),
//!             Quat::identity(),
//!         ),
//!     );
//!     spatial.on_entity_enabled(entity);
//!
//!     // Once per tick, strictly after the scene graph finalized world
//!     // matrices:
//!     spatial.post_transform_update(&mut world)?;
//!
//!     let hits = spatial.find_entities_overlapping_aabb(
//!         &Aabb::from_center_dimensions(Vec3::zeros(), Vec3::new(4.0, 4.0, 4.0)),
//!     );
//!     assert_eq!(hits.len(), 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod geometry;
pub mod bounds;
pub mod octree;
pub mod ecs;
pub mod system;
pub mod config;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        foundation::math::{Mat3, Mat4, Quat, Transform, Vec3},
        geometry::{AreaTriangle, Plane, Ray, VolumeBox, VolumeCapsule, VolumeSphere},
        bounds::{Aabb, ObjectBounds, TrueVolume},
        octree::{NodeAddress, Octant, Octree, OctreeConfig, OctreeError},
        ecs::{Component, Entity, World},
        system::{SpatialQuerySystem, SpatialSystemConfig},
        config::{Config, ConfigError},
    };
}
