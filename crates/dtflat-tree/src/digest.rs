//! Structural tree digests
//!
//! Provides [`TreeDigest`], a Blake3 hash over the attached part of a tree.
//! Two trees with equal digests have the same node names, properties,
//! values and ordering.

use crate::tree::{ConfigTree, NodeId};
use std::fmt::{self, Display, Formatter};

/// A 32-byte structural digest (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeDigest([u8; 32]);

impl TreeDigest {
    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest of the attached part of `tree`
    #[must_use]
    pub fn compute(tree: &ConfigTree) -> Self {
        let mut hasher = blake3::Hasher::new();
        feed(tree, tree.root(), &mut hasher);
        Self(*hasher.finalize().as_bytes())
    }

    /// Underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for TreeDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// Length-prefixed fields keep distinct trees from colliding on concatenation.
fn feed(tree: &ConfigTree, id: NodeId, hasher: &mut blake3::Hasher) {
    let Some(node) = tree.node(id) else {
        return;
    };
    write_field(hasher, node.name().as_bytes());
    hasher.update(&(node.properties().len() as u64).to_le_bytes());
    for prop in node.properties() {
        write_field(hasher, prop.name().as_bytes());
        write_field(hasher, prop.value().as_bytes());
    }
    hasher.update(&(node.children().len() as u64).to_le_bytes());
    for child in node.children() {
        feed(tree, *child, hasher);
    }
}

fn write_field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

impl ConfigTree {
    /// Structural digest of the attached tree
    #[must_use]
    pub fn digest(&self) -> TreeDigest {
        TreeDigest::compute(self)
    }
}
