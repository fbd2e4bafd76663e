//! Node addressing
//!
//! A node's position in the tree is its path from the root: one 3-bit
//! octant selector per level. Addresses are handled as an explicit
//! (depth, route) pair; the packed single-integer form exists only at
//! storage boundaries via [`NodeAddress::pack`]/[`NodeAddress::unpack`].
//!
//! Packed layout: the top [`DEPTH_BITS`] bits hold the depth counter, the
//! low [`ROUTE_BITS`] bits hold the selectors with the most recently
//! appended level in the highest used bits (closest to the depth field).
//! Packed zero is reserved as "no address".

use bitflags::bitflags;

use super::OctreeError;

bitflags! {
    /// Octant selector within a parent region
    ///
    /// A set bit picks the positive half along that axis; octant 0 is the
    /// left-bottom-back child. The same bit layout indexes box corners in
    /// [`crate::geometry::corner_sign`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Octant: u8 {
        /// Positive x half (+x is right)
        const RIGHT = 0b001;
        /// Positive y half (+y is up)
        const TOP = 0b010;
        /// Positive z half (+z is front)
        const FRONT = 0b100;
    }
}

impl Octant {
    /// All 8 octants in index order
    pub fn all_octants() -> impl Iterator<Item = Octant> {
        (0..8u8).map(Octant::from_bits_truncate)
    }

    /// The octant on the opposite side of every axis
    #[must_use]
    pub fn opposite(self) -> Octant {
        Octant::from_bits_truncate(!self.bits() & 0b111)
    }
}

/// Bits reserved for the depth counter in the packed form
pub const DEPTH_BITS: u32 = 5;

/// Bit offset of the depth field in the packed form
pub const DEPTH_BIT_OFFSET: u32 = u64::BITS - DEPTH_BITS;

/// Bits usable for octant selectors (whole 3-bit groups only)
pub const ROUTE_BITS: u32 = (DEPTH_BIT_OFFSET / 3) * 3;

/// Maximum node depth, inclusive; the root is depth 1 and needs no
/// selector bits
pub const MAX_DEPTH: u8 = 1 + (ROUTE_BITS / 3) as u8;

/// Reserved packed value meaning "no address"
pub const NO_ADDRESS: u64 = 0;

const ROUTE_MASK: u64 = (1 << ROUTE_BITS) - 1;

/// Address of a node: its depth and the octant route from the root
///
/// The root has depth 1 and an empty route. The selector chosen at level
/// `d` (to step from the node at depth `d - 1` down to depth `d`) sits at
/// route bits `3 * (d - 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeAddress {
    depth: u8,
    route: u64,
}

impl NodeAddress {
    /// The root address
    #[must_use]
    pub const fn root() -> Self {
        Self { depth: 1, route: 0 }
    }

    /// Depth of the node this address names (root = 1)
    #[must_use]
    pub const fn depth(self) -> u8 {
        self.depth
    }

    /// Whether this is the root address
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.depth == 1
    }

    /// Address of the child at the given octant
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError::DepthExceeded`] when the child would not be
    /// encodable in the address layout.
    pub fn child(self, octant: Octant) -> Result<Self, OctreeError> {
        if self.depth >= MAX_DEPTH {
            return Err(OctreeError::DepthExceeded);
        }
        Ok(Self {
            depth: self.depth + 1,
            route: self.route | u64::from(octant.bits()) << (3 * (self.depth - 1)),
        })
    }

    /// Address of the parent node, or `None` at the root
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let selector_shift = 3 * (self.depth - 2);
        Some(Self {
            depth: self.depth - 1,
            route: self.route & !(0b111 << selector_shift),
        })
    }

    /// The selector leading from the parent to this node, or `None` at
    /// the root
    #[must_use]
    pub fn octant(self) -> Option<Octant> {
        self.octant_at(self.depth)
    }

    /// The selector chosen to reach the node at `level` along this
    /// address's route, for `level` in `2..=depth`
    #[must_use]
    pub fn octant_at(self, level: u8) -> Option<Octant> {
        if level < 2 || level > self.depth {
            return None;
        }
        let bits = (self.route >> (3 * (level - 2))) & 0b111;
        Some(Octant::from_bits_truncate(bits as u8))
    }

    /// Re-derive this address after the tree grew one level outward
    ///
    /// The old root became the child of the new root at `root_octant`;
    /// every pre-growth address gains that selector as its new first
    /// step.
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError::DepthExceeded`] when the grown address would
    /// not be encodable.
    pub fn grow(self, root_octant: Octant) -> Result<Self, OctreeError> {
        if self.depth >= MAX_DEPTH {
            return Err(OctreeError::DepthExceeded);
        }
        Ok(Self {
            depth: self.depth + 1,
            route: (self.route << 3) | u64::from(root_octant.bits()),
        })
    }

    /// Re-derive this address after `levels` root-side levels were
    /// removed by tree shrinking
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError::ShrinkPastRoot`] if the address does not
    /// have that many levels.
    pub fn shrink(self, levels: u8) -> Result<Self, OctreeError> {
        if levels >= self.depth {
            return Err(OctreeError::ShrinkPastRoot);
        }
        Ok(Self {
            depth: self.depth - levels,
            route: self.route >> (3 * levels),
        })
    }

    /// Whether two addresses lie on one root-to-leaf branch
    ///
    /// True iff their selector sequences agree for the shorter of the two
    /// depths.
    #[must_use]
    pub fn shares_branch(self, other: Self) -> bool {
        let common_levels = u32::from(self.depth.min(other.depth)) - 1;
        let mask = (1_u64 << (3 * common_levels)) - 1;
        (self.route & mask) == (other.route & mask)
    }

    /// Pack into the single-integer storage form
    #[must_use]
    pub fn pack(self) -> u64 {
        (u64::from(self.depth) << DEPTH_BIT_OFFSET) | self.route
    }

    /// Unpack from the single-integer storage form
    ///
    /// # Errors
    ///
    /// Returns [`OctreeError::InvalidAddress`] for the reserved zero
    /// value, a depth outside `1..=MAX_DEPTH`, or route bits beyond what
    /// the depth allows.
    pub fn unpack(packed: u64) -> Result<Self, OctreeError> {
        if packed == NO_ADDRESS {
            return Err(OctreeError::InvalidAddress(packed));
        }
        let depth = (packed >> DEPTH_BIT_OFFSET) as u8;
        let route = packed & ROUTE_MASK;
        if depth == 0 || depth > MAX_DEPTH {
            return Err(OctreeError::InvalidAddress(packed));
        }
        let used_bits = 3 * u32::from(depth - 1);
        if used_bits < ROUTE_BITS && route >> used_bits != 0 {
            return Err(OctreeError::InvalidAddress(packed));
        }
        Ok(Self { depth, route })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(DEPTH_BIT_OFFSET, 59);
        assert_eq!(ROUTE_BITS, 57);
        assert_eq!(MAX_DEPTH, 20);
    }

    #[test]
    fn test_child_parent_round_trip() {
        let address = NodeAddress::root()
            .child(Octant::RIGHT | Octant::TOP)
            .unwrap()
            .child(Octant::FRONT)
            .unwrap();
        assert_eq!(address.depth(), 3);
        assert_eq!(address.octant(), Some(Octant::FRONT));
        assert_eq!(address.octant_at(2), Some(Octant::RIGHT | Octant::TOP));
        assert_eq!(
            address.parent().unwrap().octant(),
            Some(Octant::RIGHT | Octant::TOP)
        );
        assert_eq!(address.parent().unwrap().parent(), Some(NodeAddress::root()));
        assert_eq!(NodeAddress::root().parent(), None);
    }

    #[test]
    fn test_octant_round_trip_to_max_depth() {
        // Walk a pseudo-random route down to the depth limit and check
        // every recorded selector survives.
        let mut address = NodeAddress::root();
        let mut selectors = Vec::new();
        for level in 2..=MAX_DEPTH {
            let octant = Octant::from_bits_truncate((level * 5 + 3) % 8);
            selectors.push(octant);
            address = address.child(octant).unwrap();
        }
        assert_eq!(address.depth(), MAX_DEPTH);
        for (index, expected) in selectors.iter().enumerate() {
            let level = index as u8 + 2;
            assert_eq!(address.octant_at(level), Some(*expected));
        }
        assert_eq!(address.child(Octant::empty()), Err(OctreeError::DepthExceeded));
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let address = NodeAddress::root()
            .child(Octant::FRONT)
            .unwrap()
            .child(Octant::RIGHT)
            .unwrap()
            .child(Octant::TOP | Octant::FRONT)
            .unwrap();
        let packed = address.pack();
        assert_ne!(packed, NO_ADDRESS);
        assert_eq!(NodeAddress::unpack(packed).unwrap(), address);
    }

    #[test]
    fn test_unpack_rejects_invalid() {
        assert!(NodeAddress::unpack(NO_ADDRESS).is_err());
        // Depth beyond the limit.
        assert!(NodeAddress::unpack(u64::from(MAX_DEPTH + 1) << DEPTH_BIT_OFFSET).is_err());
        // Root with stray route bits.
        assert!(NodeAddress::unpack((1 << DEPTH_BIT_OFFSET) | 0b101).is_err());
    }

    #[test]
    fn test_grow_then_shrink_is_identity() {
        let address = NodeAddress::root()
            .child(Octant::TOP)
            .unwrap()
            .child(Octant::RIGHT | Octant::FRONT)
            .unwrap();
        for octant in Octant::all_octants() {
            let grown = address.grow(octant).unwrap();
            assert_eq!(grown.depth(), address.depth() + 1);
            // The prepended selector is the new first step.
            assert_eq!(grown.octant_at(2), Some(octant));
            assert_eq!(grown.shrink(1).unwrap(), address);
        }
    }

    #[test]
    fn test_grow_root_becomes_child() {
        let grown = NodeAddress::root().grow(Octant::RIGHT).unwrap();
        assert_eq!(grown, NodeAddress::root().child(Octant::RIGHT).unwrap());
    }

    #[test]
    fn test_shrink_past_root_rejected() {
        assert_eq!(
            NodeAddress::root().shrink(1),
            Err(OctreeError::ShrinkPastRoot)
        );
    }

    #[test]
    fn test_shares_branch() {
        let left = NodeAddress::root().child(Octant::empty()).unwrap();
        let right = NodeAddress::root().child(Octant::RIGHT).unwrap();
        let deep_left = left.child(Octant::TOP).unwrap();

        assert!(NodeAddress::root().shares_branch(deep_left));
        assert!(left.shares_branch(deep_left));
        assert!(deep_left.shares_branch(left));
        assert!(!right.shares_branch(deep_left));
        assert!(left.shares_branch(left));
    }

    #[test]
    fn test_opposite_octant() {
        assert_eq!(Octant::empty().opposite(), Octant::all());
        assert_eq!(
            (Octant::RIGHT | Octant::TOP).opposite(),
            Octant::FRONT
        );
    }
}
