//! dtflat Tree
//!
//! In-memory hardware-description tree with transactional change sets.
//!
//! # Core Concepts
//!
//! - [`ConfigTree`]: Arena of named nodes with ordered properties and children
//! - [`NodePath`]: Absolute `/`-separated addressing, derived from position
//! - [`PropValue`]: Opaque property payload with string/cell helpers
//! - [`ChangeSet`]: Staged edits committed atomically, reverted exactly
//! - [`TreeSnapshot`]: Serializable, order-preserving description of a tree
//! - [`TreeDigest`]: Blake3 structural digest
//!
//! # Example
//!
//! ```rust
//! use dtflat_tree::{ChangeSet, NodeSnapshot, TreeSnapshot};
//!
//! let mut tree = TreeSnapshot::new(NodeSnapshot::new("")).build().unwrap();
//! let before = tree.snapshot();
//!
//! let mut cs = ChangeSet::new("example");
//! let node = cs.create_node(&tree, tree.root(), "__symbols__").unwrap();
//! cs.add_property_string(&tree, node, "intc", "/soc@0/interrupt-controller@17a00000")
//!     .unwrap();
//!
//! cs.commit(&mut tree).unwrap();
//! assert_ne!(tree.snapshot(), before);
//!
//! cs.revert(&mut tree).unwrap();
//! assert_eq!(tree.snapshot(), before);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod changeset;
mod digest;
mod path;
mod snapshot;
mod tree;
mod value;

// Re-exports
pub use changeset::{ChangeSet, ChangeSetError, ChangeSetState, CommitError, Edit, NodeRef, StagingError};
pub use digest::TreeDigest;
pub use path::{NodePath, PathError};
pub use snapshot::{NodeSnapshot, SnapshotError, TreeSnapshot};
pub use tree::{
    validate_node_name, validate_property_name, ConfigNode, ConfigTree, NodeId, Property, TreeError,
    COMPATIBLE,
};
pub use value::{PropValue, ValueError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
