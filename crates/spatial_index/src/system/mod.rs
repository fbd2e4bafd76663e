//! Spatial query system
//!
//! Per-tick orchestrator between the entity world and the octree. Entity
//! lifecycle notifications only mark work; the octree mutates in exactly
//! one place, [`SpatialQuerySystem::post_transform_update`], which the
//! caller runs after transform propagation has settled for the tick.
//! Everything is single-threaded; queries between ticks are pure reads.

mod bounds_sources;

pub use bounds_sources::{light_bounds, mesh_bounds, LightEmission};

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::bounds::{Aabb, ObjectBounds, TrueVolume};
use crate::config::Config;
use crate::ecs::{Entity, World};
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::geometry::Ray;
use crate::octree::{Octree, OctreeConfig, OctreeError};

/// Configuration for [`SpatialQuerySystem`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialSystemConfig {
    /// Octree subdivision threshold
    pub subdivision_threshold: usize,
    /// Center of the initial indexed region
    pub world_center: Vec3,
    /// Full dimensions of the initial indexed region; the tree grows past
    /// it on demand
    pub world_dimensions: Vec3,
}

impl Default for SpatialSystemConfig {
    fn default() -> Self {
        Self {
            subdivision_threshold: OctreeConfig::default().subdivision_threshold,
            world_center: Vec3::zeros(),
            world_dimensions: Vec3::new(1000.0, 1000.0, 1000.0),
        }
    }
}

impl Config for SpatialSystemConfig {}

impl SpatialSystemConfig {
    fn initial_region(&self) -> Aabb {
        Aabb::from_center_dimensions(self.world_center, self.world_dimensions)
    }

    fn octree_config(&self) -> OctreeConfig {
        OctreeConfig {
            subdivision_threshold: self.subdivision_threshold,
        }
    }
}

/// Cached inputs of the last bounds computation, used to filter out
/// no-op update notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundsSnapshot {
    model_matrix: Mat4,
    volume: TrueVolume,
    position_offset: Vec3,
    orientation_offset: Quat,
}

/// Octree-backed spatial index over the entities of a [`World`]
///
/// Drive it with the lifecycle notifications, then call
/// [`SpatialQuerySystem::post_transform_update`] once per tick after the
/// scene's transforms are final. Entities participate while they are
/// enabled and carry an [`ObjectBounds`] component; the recomputed world
/// [`Aabb`] is written back to the world as a component.
pub struct SpatialQuerySystem {
    config: SpatialSystemConfig,
    octree: Octree,
    dirty: HashSet<Entity>,
    rebuild_pending: bool,
    snapshots: HashMap<Entity, BoundsSnapshot>,
}

impl SpatialQuerySystem {
    /// Create a system indexing the configured initial region
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError::InvalidRegion`] for an unusable region.
    pub fn new(config: &SpatialSystemConfig) -> Result<Self, OctreeError> {
        let octree = Octree::new(config.octree_config(), config.initial_region())?;
        Ok(Self {
            config: *config,
            octree,
            dirty: HashSet::new(),
            rebuild_pending: false,
            snapshots: HashMap::new(),
        })
    }

    /// The configuration this system was built with
    #[must_use]
    pub fn config(&self) -> &SpatialSystemConfig {
        &self.config
    }

    /// Number of currently indexed entities
    #[must_use]
    pub fn indexed_entity_count(&self) -> usize {
        self.octree.entity_count()
    }

    /// Notification: an entity became enabled; queue it for indexing
    pub fn on_entity_enabled(&mut self, entity: Entity) {
        self.dirty.insert(entity);
    }

    /// Notification: an entity changed this tick
    ///
    /// Queues a re-index only when the inputs of the bounds computation
    /// (final model matrix, volume, offsets) actually differ from the last
    /// indexed state.
    pub fn on_entity_updated(&mut self, entity: Entity, world: &World) {
        match Self::snapshot_of(entity, world) {
            Some(snapshot) => {
                if self.snapshots.get(&entity) != Some(&snapshot) {
                    self.dirty.insert(entity);
                }
            }
            // No bounds component; make sure a stale index entry goes away.
            None => {
                if self.snapshots.contains_key(&entity) {
                    self.dirty.insert(entity);
                }
            }
        }
    }

    /// Notification: an entity became disabled; drop it from the index
    ///
    /// Skipped when a full rebuild is already pending this tick, since the
    /// rebuild only re-inserts enabled entities.
    pub fn on_entity_disabled(&mut self, entity: Entity) {
        self.dirty.remove(&entity);
        self.snapshots.remove(&entity);
        if !self.rebuild_pending {
            self.octree.remove(entity);
        }
    }

    /// Notification: the simulation (re)activated; force a full rebuild on
    /// the next update step
    pub fn on_simulation_activated(&mut self) {
        self.rebuild_pending = true;
    }

    /// The single per-tick mutation step; run after transform propagation
    ///
    /// Performs either the pending full rebuild or an incremental
    /// re-index of the entities queued since the last step, writing each
    /// recomputed world [`Aabb`] back as a component. The dirty set is
    /// cleared unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError`] when an entity carries invalid bounds or
    /// the tree cannot grow to hold one; these are fatal to the index.
    pub fn post_transform_update(&mut self, world: &mut World) -> Result<(), OctreeError> {
        if self.rebuild_pending {
            let result = self.rebuild(world);
            self.rebuild_pending = false;
            self.dirty.clear();
            return result;
        }

        let dirty: Vec<Entity> = self.dirty.drain().collect();
        for entity in dirty {
            if world.is_enabled(entity) && Self::snapshot_of(entity, world).is_some() {
                self.index_entity(entity, world)?;
            } else {
                self.octree.remove(entity);
                self.snapshots.remove(&entity);
            }
        }
        Ok(())
    }

    /// Entities whose world bounds overlap `query`, sorted by entity
    #[must_use]
    pub fn find_entities_overlapping_aabb(&self, query: &Aabb) -> Vec<(Entity, Aabb)> {
        self.octree.entities_overlapping_aabb(query)
    }

    /// Entities whose world bounds overlap `ray`, sorted by entity
    #[must_use]
    pub fn find_entities_overlapping_ray(&self, ray: &Ray) -> Vec<(Entity, Aabb)> {
        self.octree.entities_overlapping_ray(ray)
    }

    fn rebuild(&mut self, world: &mut World) -> Result<(), OctreeError> {
        debug!("spatial system: full rebuild");
        self.octree = Octree::new(self.config.octree_config(), self.config.initial_region())?;
        self.snapshots.clear();
        let enabled: Vec<Entity> = world.enabled_entities().collect();
        for entity in enabled {
            if Self::snapshot_of(entity, world).is_some() {
                self.index_entity(entity, world)?;
            }
        }
        Ok(())
    }

    /// Recompute an entity's world bounds and (re)insert it.
    fn index_entity(&mut self, entity: Entity, world: &mut World) -> Result<(), OctreeError> {
        let model_matrix = world
            .get_component::<Transform>(entity)
            .map_or_else(Mat4::identity, Transform::to_matrix);
        let Some(bounds) = world.get_component::<ObjectBounds>(entity) else {
            return Ok(());
        };
        let mut bounds = *bounds;
        bounds.apply_model_matrix(&model_matrix);
        let world_aabb = Aabb::from(&bounds);

        let address = self.octree.insert(entity, world_aabb)?;
        trace!(
            "spatial system: indexed entity at node {:#018x} (depth {})",
            address.pack(),
            address.depth()
        );

        self.snapshots.insert(
            entity,
            BoundsSnapshot {
                model_matrix,
                volume: bounds.volume,
                position_offset: bounds.position_offset,
                orientation_offset: bounds.orientation_offset,
            },
        );
        world.insert_component(entity, bounds);
        world.insert_component(entity, world_aabb);
        Ok(())
    }

    fn snapshot_of(entity: Entity, world: &World) -> Option<BoundsSnapshot> {
        let bounds = world.get_component::<ObjectBounds>(entity)?;
        let model_matrix = world
            .get_component::<Transform>(entity)
            .map_or_else(Mat4::identity, Transform::to_matrix);
        Some(BoundsSnapshot {
            model_matrix,
            volume: bounds.volume,
            position_offset: bounds.position_offset,
            orientation_offset: bounds.orientation_offset,
        })
    }
}
