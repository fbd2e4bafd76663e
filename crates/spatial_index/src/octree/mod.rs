//! Dynamic octree spatial index
//!
//! An addressable sparse octree: nodes are identified by a bit-packable
//! address describing their path from the root, children are created
//! lazily, and the root can be re-based outward (grow) or inward (shrink)
//! as the indexed entities move. Entities live at the deepest node whose
//! region fully contains their world AABB; an entity straddling children
//! stays at the straddled level (a loose octree).

mod address;
mod node;
mod tree;

pub use address::{NodeAddress, Octant, MAX_DEPTH, NO_ADDRESS};
pub use node::OctreeNode;
pub use tree::{Octree, OctreeConfig};

use crate::geometry::GeometryError;

/// Errors raised by octree construction and structural operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OctreeError {
    /// A region with non-finite, non-positive, or overly skewed dimensions
    /// was passed to tree construction
    #[error("invalid octree region: {0}")]
    InvalidRegion(String),

    /// A structural operation would push an address past the maximum
    /// depth encodable in the address layout
    #[error("octree depth limit ({MAX_DEPTH}) exceeded")]
    DepthExceeded,

    /// A packed address failed validation (reserved zero, depth out of
    /// range, or stray route bits)
    #[error("invalid packed octree address {0:#018x}")]
    InvalidAddress(u64),

    /// An address cannot lose more levels than it has
    #[error("cannot shrink an address past the root")]
    ShrinkPastRoot,

    /// A stored address pointed at a node that no longer exists
    #[error("no node stored at address {0:#018x}")]
    DanglingAddress(u64),

    /// An invalid geometric input reached the octree
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
