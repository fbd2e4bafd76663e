//! The octree container
//!
//! Owns every node in an address-keyed map plus a global entity-to-address
//! map for O(1) removal. All structural changes (subdivision, growth,
//! shrinking, pruning) happen inside [`Octree::insert`] and
//! [`Octree::remove`]; queries are pure reads.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::{NodeAddress, Octant, OctreeError, OctreeNode, MAX_DEPTH};
use crate::bounds::Aabb;
use crate::ecs::Entity;
use crate::foundation::math::Vec3;
use crate::geometry::{ray_overlaps_aabb, GeometryError, Ray};

/// The root region may not be more elongated than this along any axis pair;
/// skewed regions degrade the octree into a list.
const MAX_DIMENSION_RATIO: f32 = 20.0;

/// Tuning parameters for [`Octree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctreeConfig {
    /// Member count above which a node pushes down members that fit wholly
    /// inside one child octant
    pub subdivision_threshold: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            subdivision_threshold: 8,
        }
    }
}

/// Dynamic loose octree over entity bounding boxes
///
/// Each entity lives at the deepest allocated node whose region fully
/// contains its world AABB. The root region doubles outward when an entity
/// does not fit ([`Octree::insert`] grows as often as needed) and collapses
/// back when the root ends up with a single populated child subtree.
#[derive(Debug, Clone)]
pub struct Octree {
    config: OctreeConfig,
    region: Aabb,
    nodes: HashMap<NodeAddress, OctreeNode>,
    entity_addresses: HashMap<Entity, NodeAddress>,
}

impl Octree {
    /// Create an empty octree covering `region`
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError::InvalidRegion`] when the region is non-finite,
    /// has a non-positive dimension, or is more elongated than the maximum
    /// dimension ratio allows.
    pub fn new(config: OctreeConfig, region: Aabb) -> Result<Self, OctreeError> {
        if !region.is_sensible() {
            return Err(OctreeError::InvalidRegion(format!(
                "non-finite extents: {:?} to {:?}",
                region.min, region.max
            )));
        }
        let dimensions = region.dimensions();
        if dimensions.x <= 0.0 || dimensions.y <= 0.0 || dimensions.z <= 0.0 {
            return Err(OctreeError::InvalidRegion(format!(
                "non-positive dimensions: {dimensions:?}"
            )));
        }
        if dimensions.max() / dimensions.min() > MAX_DIMENSION_RATIO {
            return Err(OctreeError::InvalidRegion(format!(
                "dimension ratio exceeds {MAX_DIMENSION_RATIO}: {dimensions:?}"
            )));
        }

        let root = NodeAddress::root();
        let mut nodes = HashMap::new();
        nodes.insert(root, OctreeNode::new(root, region));
        Ok(Self {
            config,
            region,
            nodes,
            entity_addresses: HashMap::new(),
        })
    }

    /// The configuration this tree was built with
    #[must_use]
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// The current root region; growth and shrinking change it
    #[must_use]
    pub fn region(&self) -> &Aabb {
        &self.region
    }

    /// Number of indexed entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_addresses.len()
    }

    /// Number of allocated nodes (at least 1, the root)
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `entity` is currently indexed
    #[must_use]
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entity_addresses.contains_key(&entity)
    }

    /// Address of the node holding `entity`, if indexed
    #[must_use]
    pub fn address_of(&self, entity: Entity) -> Option<NodeAddress> {
        self.entity_addresses.get(&entity).copied()
    }

    /// The node at `address`, if allocated
    #[must_use]
    pub fn node_at(&self, address: NodeAddress) -> Option<&OctreeNode> {
        self.nodes.get(&address)
    }

    /// Insert (or move) an entity with its world bounds
    ///
    /// Grows the root as often as needed to contain `bounds`, then places
    /// the entity at the deepest allocated node fully containing it. Nodes
    /// pushed over the subdivision threshold redistribute members that fit
    /// wholly inside one child octant.
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError::Geometry`] for non-finite bounds and
    /// [`OctreeError::DepthExceeded`] when growth would push an existing
    /// node past the maximum depth.
    pub fn insert(&mut self, entity: Entity, bounds: Aabb) -> Result<NodeAddress, OctreeError> {
        if !bounds.is_sensible() {
            return Err(GeometryError::NonFinite("entity world bounds").into());
        }
        self.remove(entity);

        while !self.region.contains_aabb(&bounds) {
            self.grow_toward(&bounds)?;
        }

        let mut address = NodeAddress::root();
        loop {
            let node = self.node(address)?;
            match node.octant_containing(&bounds) {
                Some(octant) if node.has_child(octant) => {
                    address = address.child(octant)?;
                }
                _ => break,
            }
        }
        self.node_mut(address)?.insert_member(entity, bounds);
        self.entity_addresses.insert(entity, address);
        self.subdivide_overflowing(address)?;

        self.entity_addresses
            .get(&entity)
            .copied()
            .ok_or(OctreeError::DanglingAddress(address.pack()))
    }

    /// Remove an entity from the index
    ///
    /// Unknown entities are a tolerated no-op; returns whether anything was
    /// removed. Emptied leaf nodes are pruned upward, and the root shrinks
    /// while it holds no members and exactly one child subtree.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(address) = self.entity_addresses.remove(&entity) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(&address) {
            node.remove_member(entity);
        }
        self.prune_upward(address);
        self.shrink_root();
        true
    }

    /// All entities whose bounds overlap `query`, sorted by entity
    #[must_use]
    pub fn entities_overlapping_aabb(&self, query: &Aabb) -> Vec<(Entity, Aabb)> {
        self.collect_overlapping(
            |region| region.intersects(query),
            |bounds| bounds.intersects(query),
        )
    }

    /// All entities whose bounds overlap `ray`, sorted by entity
    #[must_use]
    pub fn entities_overlapping_ray(&self, ray: &Ray) -> Vec<(Entity, Aabb)> {
        self.collect_overlapping(
            |region| ray_overlaps_aabb(ray, region),
            |bounds| ray_overlaps_aabb(ray, bounds),
        )
    }

    /// Every indexed entity with its stored bounds, sorted by entity
    #[must_use]
    pub fn all_member_entities(&self) -> Vec<(Entity, Aabb)> {
        self.collect_overlapping(|_| true, |_| true)
    }

    fn collect_overlapping<R, M>(&self, region_hits: R, member_hits: M) -> Vec<(Entity, Aabb)>
    where
        R: Fn(&Aabb) -> bool,
        M: Fn(&Aabb) -> bool,
    {
        let mut results = Vec::new();
        let mut stack = vec![NodeAddress::root()];
        while let Some(address) = stack.pop() {
            let Some(node) = self.nodes.get(&address) else {
                continue;
            };
            if !region_hits(node.region()) {
                continue;
            }
            for (entity, bounds) in node.members() {
                if member_hits(bounds) {
                    results.push((entity, *bounds));
                }
            }
            for octant in node.child_octants() {
                if let Ok(child) = address.child(octant) {
                    stack.push(child);
                }
            }
        }
        results.sort_by_key(|(entity, _)| *entity);
        results
    }

    fn node(&self, address: NodeAddress) -> Result<&OctreeNode, OctreeError> {
        self.nodes
            .get(&address)
            .ok_or(OctreeError::DanglingAddress(address.pack()))
    }

    fn node_mut(&mut self, address: NodeAddress) -> Result<&mut OctreeNode, OctreeError> {
        self.nodes
            .get_mut(&address)
            .ok_or(OctreeError::DanglingAddress(address.pack()))
    }

    /// Allocate the child at `octant` if it does not exist yet.
    fn ensure_child(
        &mut self,
        parent: NodeAddress,
        octant: Octant,
    ) -> Result<NodeAddress, OctreeError> {
        let child_address = parent.child(octant)?;
        if !self.node(parent)?.has_child(octant) {
            let region = self.node(parent)?.child_region(octant);
            self.nodes
                .insert(child_address, OctreeNode::new(child_address, region));
            self.node_mut(parent)?.set_child(octant);
            trace!(
                "octree: allocated node {:#018x} at depth {}",
                child_address.pack(),
                child_address.depth()
            );
        }
        Ok(child_address)
    }

    /// Push members of over-threshold nodes down into children, starting at
    /// `start` and following any child that overflows in turn. Members
    /// straddling a bisection plane stay put.
    fn subdivide_overflowing(&mut self, start: NodeAddress) -> Result<(), OctreeError> {
        let threshold = self.config.subdivision_threshold;
        let mut worklist = vec![start];
        while let Some(address) = worklist.pop() {
            if self.node(address)?.member_count() <= threshold || address.depth() >= MAX_DEPTH {
                continue;
            }
            let members = self.node_mut(address)?.take_members();
            let mut overflowed = Vec::new();
            for (entity, bounds) in members {
                match self.node(address)?.octant_containing(&bounds) {
                    Some(octant) => {
                        let child_address = self.ensure_child(address, octant)?;
                        self.node_mut(child_address)?.insert_member(entity, bounds);
                        self.entity_addresses.insert(entity, child_address);
                        if !overflowed.contains(&child_address) {
                            overflowed.push(child_address);
                        }
                    }
                    None => {
                        self.node_mut(address)?.insert_member(entity, bounds);
                    }
                }
            }
            worklist.extend(overflowed);
        }
        Ok(())
    }

    /// Deallocate empty leaf nodes from `address` toward the root.
    fn prune_upward(&mut self, mut address: NodeAddress) {
        while let (Some(parent), Some(octant)) = (address.parent(), address.octant()) {
            let removable = self
                .nodes
                .get(&address)
                .is_some_and(|node| node.is_empty() && node.is_leaf());
            if !removable {
                return;
            }
            self.nodes.remove(&address);
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.clear_child(octant);
            }
            address = parent;
        }
    }

    /// Double the root region away from its overhang with `bounds`,
    /// re-basing every stored address one level deeper.
    fn grow_toward(&mut self, bounds: &Aabb) -> Result<(), OctreeError> {
        if self.nodes.keys().any(|address| address.depth() >= MAX_DEPTH) {
            return Err(OctreeError::DepthExceeded);
        }

        let dimensions = self.region.dimensions();
        let mut growth = Octant::empty();
        let grows_positive = |positive_overhang: f32, negative_overhang: f32| {
            positive_overhang.max(0.0) >= negative_overhang.max(0.0)
        };
        if grows_positive(
            bounds.max.x - self.region.max.x,
            self.region.min.x - bounds.min.x,
        ) {
            growth |= Octant::RIGHT;
        }
        if grows_positive(
            bounds.max.y - self.region.max.y,
            self.region.min.y - bounds.min.y,
        ) {
            growth |= Octant::TOP;
        }
        if grows_positive(
            bounds.max.z - self.region.max.z,
            self.region.min.z - bounds.min.z,
        ) {
            growth |= Octant::FRONT;
        }

        let stretch = |grows: bool, min: f32, max: f32, size: f32| {
            if grows {
                (min, max + size)
            } else {
                (min - size, max)
            }
        };
        let (min_x, max_x) = stretch(
            growth.contains(Octant::RIGHT),
            self.region.min.x,
            self.region.max.x,
            dimensions.x,
        );
        let (min_y, max_y) = stretch(
            growth.contains(Octant::TOP),
            self.region.min.y,
            self.region.max.y,
            dimensions.y,
        );
        let (min_z, max_z) = stretch(
            growth.contains(Octant::FRONT),
            self.region.min.z,
            self.region.max.z,
            dimensions.z,
        );
        let new_region = Aabb::new(Vec3::new(min_x, min_y, min_z), Vec3::new(max_x, max_y, max_z));

        // The old root becomes the child opposite the growth direction.
        let inner_octant = growth.opposite();
        debug!(
            "octree: growing root toward {growth:?}, new region {:?} to {:?}",
            new_region.min, new_region.max
        );

        let old_nodes = std::mem::take(&mut self.nodes);
        let mut rekeyed = HashMap::with_capacity(old_nodes.len() + 1);
        for (address, mut node) in old_nodes {
            let new_address = address.grow(inner_octant)?;
            node.set_address(new_address);
            rekeyed.insert(new_address, node);
        }
        let mut new_root = OctreeNode::new(NodeAddress::root(), new_region);
        new_root.set_child(inner_octant);
        rekeyed.insert(NodeAddress::root(), new_root);
        self.nodes = rekeyed;

        for address in self.entity_addresses.values_mut() {
            *address = address.grow(inner_octant)?;
        }
        self.region = new_region;
        Ok(())
    }

    /// While the root holds no members and exactly one child subtree, drop
    /// the root level and promote the child, re-basing every address.
    fn shrink_root(&mut self) {
        loop {
            let collapses = self
                .nodes
                .get(&NodeAddress::root())
                .is_some_and(|root| root.is_empty() && root.child_count() == 1);
            if !collapses {
                return;
            }

            self.nodes.remove(&NodeAddress::root());
            let old_nodes = std::mem::take(&mut self.nodes);
            let mut rekeyed = HashMap::with_capacity(old_nodes.len());
            for (address, mut node) in old_nodes {
                if let Ok(new_address) = address.shrink(1) {
                    node.set_address(new_address);
                    rekeyed.insert(new_address, node);
                }
            }
            self.nodes = rekeyed;
            for address in self.entity_addresses.values_mut() {
                if let Ok(shrunk) = address.shrink(1) {
                    *address = shrunk;
                }
            }

            if let Some(root) = self.nodes.get(&NodeAddress::root()) {
                self.region = *root.region();
                debug!(
                    "octree: shrunk root, new region {:?} to {:?}",
                    self.region.min, self.region.max
                );
            } else {
                return;
            }
        }
    }
}
