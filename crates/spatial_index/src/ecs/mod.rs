//! Minimal entity/component substrate
//!
//! The spatial system is driven by an external scene layer; this module is
//! the in-process stand-in it runs against. Entities are generational
//! slotmap keys, components live in per-type storages keyed by `TypeId`.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::bounds::{Aabb, ObjectBounds};
use crate::foundation::math::Transform;

new_key_type! {
    /// Generational entity handle
    ///
    /// Keys are `Ord`, which gives spatial query results a deterministic
    /// order.
    pub struct Entity;
}

/// Marker trait for data attachable to an entity
pub trait Component: 'static + Send + Sync {}

impl Component for Transform {}
impl Component for ObjectBounds {}
impl Component for Aabb {}

#[derive(Debug, Clone, Copy)]
struct EntityMeta {
    enabled: bool,
}

trait ComponentStorage {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_entity(&mut self, entity: Entity);
}

impl<T: Component> ComponentStorage for HashMap<Entity, T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) {
        self.remove(&entity);
    }
}

/// Container for entities and their components
#[derive(Default)]
pub struct World {
    entities: SlotMap<Entity, EntityMeta>,
    storages: HashMap<TypeId, Box<dyn ComponentStorage>>,
}

impl World {
    /// Create an empty world
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new enabled entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(EntityMeta { enabled: true })
    }

    /// Destroy an entity and all of its components; unknown entities are a
    /// no-op
    pub fn destroy_entity(&mut self, entity: Entity) {
        if self.entities.remove(entity).is_some() {
            for storage in self.storages.values_mut() {
                storage.remove_entity(entity);
            }
        }
    }

    /// Whether the entity is alive
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Enable or disable an entity; unknown entities are a no-op
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) {
        if let Some(meta) = self.entities.get_mut(entity) {
            meta.enabled = enabled;
        }
    }

    /// Whether the entity is alive and enabled
    #[must_use]
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.entities.get(entity).is_some_and(|meta| meta.enabled)
    }

    /// Iterate over all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Iterate over all live, enabled entities
    pub fn enabled_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities
            .iter()
            .filter(|(_, meta)| meta.enabled)
            .map(|(entity, _)| entity)
    }

    /// Attach a component to an entity, returning any previous value
    ///
    /// Dead entities are a no-op and the component is dropped.
    pub fn insert_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        if !self.contains(entity) {
            return None;
        }
        self.storage_mut::<T>().insert(entity, component)
    }

    /// Read a component of an entity
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(&entity)
    }

    /// Mutably access a component of an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<HashMap<Entity, T>>()?
            .get_mut(&entity)
    }

    /// Detach a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<HashMap<Entity, T>>()?
            .remove(&entity)
    }

    fn storage<T: Component>(&self) -> Option<&HashMap<Entity, T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<HashMap<Entity, T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> &mut HashMap<Entity, T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(HashMap::<Entity, T>::new()));
        // The storage under a TypeId always holds that type's map.
        storage
            .as_any_mut()
            .downcast_mut::<HashMap<Entity, T>>()
            .unwrap_or_else(|| unreachable!("storage type mismatch"))
    }
}
