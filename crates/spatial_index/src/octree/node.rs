//! Octree node
//!
//! A node owns its world-space region and the membership of entities
//! whose bounds fit that region but no single child's region. Children
//! are tracked as a presence mask; the nodes themselves live in the
//! tree's address-keyed map, so the parent relation is a lookup via
//! [`NodeAddress::parent`], never ownership.

use std::collections::BTreeMap;

use super::{NodeAddress, Octant};
use crate::bounds::Aabb;
use crate::ecs::Entity;
use crate::foundation::math::Vec3;

/// Single node in the octree
#[derive(Debug, Clone)]
pub struct OctreeNode {
    address: NodeAddress,
    region: Aabb,
    members: BTreeMap<Entity, Aabb>,
    children: u8,
}

impl OctreeNode {
    /// Create a new childless, empty node covering `region`
    #[must_use]
    pub fn new(address: NodeAddress, region: Aabb) -> Self {
        Self {
            address,
            region,
            members: BTreeMap::new(),
            children: 0,
        }
    }

    /// The node's address
    #[must_use]
    pub fn address(&self) -> NodeAddress {
        self.address
    }

    /// Used by the tree when re-basing addresses after grow/shrink.
    pub(super) fn set_address(&mut self, address: NodeAddress) {
        self.address = address;
    }

    /// The node's world-space region
    #[must_use]
    pub fn region(&self) -> &Aabb {
        &self.region
    }

    /// Iterate over member entities and their world bounds
    pub fn members(&self) -> impl Iterator<Item = (Entity, &Aabb)> {
        self.members.iter().map(|(entity, bounds)| (*entity, bounds))
    }

    /// Number of entities held directly at this node
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether this node holds no entities directly
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(super) fn insert_member(&mut self, entity: Entity, bounds: Aabb) {
        self.members.insert(entity, bounds);
    }

    pub(super) fn remove_member(&mut self, entity: Entity) -> Option<Aabb> {
        self.members.remove(&entity)
    }

    pub(super) fn take_members(&mut self) -> BTreeMap<Entity, Aabb> {
        std::mem::take(&mut self.members)
    }

    /// Whether the child at `octant` has been created
    #[must_use]
    pub fn has_child(&self, octant: Octant) -> bool {
        self.children & (1 << octant.bits()) != 0
    }

    /// Number of created children (0 for a leaf)
    #[must_use]
    pub fn child_count(&self) -> u8 {
        self.children.count_ones() as u8
    }

    /// Whether this node is a leaf (no children created)
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children == 0
    }

    /// Iterate over the octants of created children
    pub fn child_octants(&self) -> impl Iterator<Item = Octant> + '_ {
        Octant::all_octants().filter(|octant| self.has_child(*octant))
    }

    pub(super) fn set_child(&mut self, octant: Octant) {
        self.children |= 1 << octant.bits();
    }

    pub(super) fn clear_child(&mut self, octant: Octant) {
        self.children &= !(1 << octant.bits());
    }

    /// The region the child at `octant` covers (whether or not it exists)
    #[must_use]
    pub fn child_region(&self, octant: Octant) -> Aabb {
        let center = self.region.center();
        let pick = |bit: bool, min: f32, mid: f32, max: f32| {
            if bit {
                (mid, max)
            } else {
                (min, mid)
            }
        };
        let (min_x, max_x) = pick(
            octant.contains(Octant::RIGHT),
            self.region.min.x,
            center.x,
            self.region.max.x,
        );
        let (min_y, max_y) = pick(
            octant.contains(Octant::TOP),
            self.region.min.y,
            center.y,
            self.region.max.y,
        );
        let (min_z, max_z) = pick(
            octant.contains(Octant::FRONT),
            self.region.min.z,
            center.z,
            self.region.max.z,
        );
        Aabb::new(Vec3::new(min_x, min_y, min_z), Vec3::new(max_x, max_y, max_z))
    }

    /// The single octant whose region fully contains `bounds`, or `None`
    /// when the bounds straddle a bisection plane (and must stay at this
    /// level)
    #[must_use]
    pub fn octant_containing(&self, bounds: &Aabb) -> Option<Octant> {
        let center = self.region.center();
        let mut octant = Octant::empty();

        if bounds.min.x >= center.x {
            octant |= Octant::RIGHT;
        } else if bounds.max.x > center.x {
            return None;
        }
        if bounds.min.y >= center.y {
            octant |= Octant::TOP;
        } else if bounds.max.y > center.y {
            return None;
        }
        if bounds.min.z >= center.z {
            octant |= Octant::FRONT;
        } else if bounds.max.z > center.z {
            return None;
        }

        Some(octant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_node() -> OctreeNode {
        OctreeNode::new(
            NodeAddress::root(),
            Aabb::from_center_dimensions(Vec3::zeros(), Vec3::new(100.0, 100.0, 100.0)),
        )
    }

    #[test]
    fn test_child_region_octants() {
        let node = test_node();

        let left_bottom_back = node.child_region(Octant::empty());
        assert_relative_eq!(left_bottom_back.min, Vec3::new(-50.0, -50.0, -50.0));
        assert_relative_eq!(left_bottom_back.max, Vec3::zeros());

        let right_top_front = node.child_region(Octant::all());
        assert_relative_eq!(right_top_front.min, Vec3::zeros());
        assert_relative_eq!(right_top_front.max, Vec3::new(50.0, 50.0, 50.0));

        let right_only = node.child_region(Octant::RIGHT);
        assert_relative_eq!(right_only.min, Vec3::new(0.0, -50.0, -50.0));
        assert_relative_eq!(right_only.max, Vec3::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn test_octant_containing() {
        let node = test_node();

        let tucked_away = Aabb::from_center_dimensions(
            Vec3::new(25.0, 25.0, 25.0),
            Vec3::new(10.0, 10.0, 10.0),
        );
        assert_eq!(node.octant_containing(&tucked_away), Some(Octant::all()));

        let straddling = Aabb::from_center_dimensions(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(node.octant_containing(&straddling), None);

        let negative_corner = Aabb::from_center_dimensions(
            Vec3::new(-25.0, -25.0, -25.0),
            Vec3::new(10.0, 10.0, 10.0),
        );
        assert_eq!(node.octant_containing(&negative_corner), Some(Octant::empty()));
    }

    #[test]
    fn test_octant_containing_touching_plane() {
        let node = test_node();
        // Box whose min face touches the bisection plane belongs to the
        // positive octant.
        let touching = Aabb::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(node.octant_containing(&touching), Some(Octant::all()));
    }

    #[test]
    fn test_child_mask() {
        let mut node = test_node();
        assert!(node.is_leaf());

        node.set_child(Octant::RIGHT);
        node.set_child(Octant::FRONT | Octant::TOP);
        assert!(node.has_child(Octant::RIGHT));
        assert!(!node.has_child(Octant::TOP));
        assert_eq!(node.child_count(), 2);
        assert_eq!(node.child_octants().count(), 2);

        node.clear_child(Octant::RIGHT);
        assert_eq!(node.child_count(), 1);
    }
}
