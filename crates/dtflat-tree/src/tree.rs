//! Hierarchical node/property tree
//!
//! Provides [`ConfigTree`], an arena of [`ConfigNode`]s addressed by
//! [`NodeId`]. The tree is read freely; it is mutated only by committing or
//! reverting a [`ChangeSet`](crate::ChangeSet) (or by building it from a
//! [`TreeSnapshot`](crate::TreeSnapshot)).
//!
//! # Invariants
//! - Sibling names are unique.
//! - A node's path is computed from its parent chain, never stored.
//! - A detached node keeps its slot so that a revert can reattach it, but it
//!   is unreachable from the root and invisible to searches.

use crate::path::NodePath;
use crate::value::PropValue;
use std::fmt::{self, Display, Formatter};

/// Property carrying a node's compatible tags
pub const COMPATIBLE: &str = "compatible";

/// Handle to a node slot in a [`ConfigTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw slot index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Named property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    value: PropValue,
}

impl Property {
    /// Property name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &PropValue {
        &self.value
    }
}

/// A node in the tree
#[derive(Debug, Clone)]
pub struct ConfigNode {
    name: String,
    parent: Option<NodeId>,
    properties: Vec<Property>,
    children: Vec<NodeId>,
}

impl ConfigNode {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Node name (empty for the root)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, `None` for the root and for detached subtree heads
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Properties in insertion order
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Children in insertion order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Lookup property by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Compatible tags, in declaration order
    #[must_use]
    pub fn compatible(&self) -> Vec<&str> {
        self.property(COMPATIBLE)
            .and_then(PropValue::strings)
            .unwrap_or_default()
    }

    /// Check if the node advertises a compatible tag
    #[must_use]
    pub fn is_compatible(&self, tag: &str) -> bool {
        self.property(COMPATIBLE)
            .is_some_and(|v| v.contains_string(tag))
    }
}

/// In-memory hardware-description tree
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Vec<Option<ConfigNode>>,
    root: NodeId,
}

impl ConfigTree {
    /// Create a tree holding only the root node
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(ConfigNode::new(String::new(), None))],
            root: NodeId(0),
        }
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get node by id (attached or detached)
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ConfigNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Check if a node is reachable from the root
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).and_then(ConfigNode::parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Children of a node (empty if unknown)
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[][..], ConfigNode::children)
    }

    /// Lookup property on a node
    #[must_use]
    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.node(id)?.property(name)
    }

    /// Absolute path of an attached node
    #[must_use]
    pub fn path(&self, id: NodeId) -> Option<NodePath> {
        let mut segments = Vec::new();
        let mut current = id;
        while current != self.root {
            let node = self.node(current)?;
            segments.push(node.name.clone());
            current = node.parent?;
        }
        segments.reverse();
        Some(NodePath::new(segments))
    }

    /// Path for log and error messages; falls back to the node id
    #[must_use]
    pub fn describe(&self, id: NodeId) -> String {
        self.path(id).map_or_else(|| id.to_string(), |p| p.to_string())
    }

    /// Direct child by name
    #[must_use]
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.node(*c).is_some_and(|n| n.name == name))
    }

    /// First direct child advertising `tag`
    #[must_use]
    pub fn compatible_child(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.node(*c).is_some_and(|n| n.is_compatible(tag)))
    }

    /// Resolve an absolute path
    #[must_use]
    pub fn find_by_path(&self, path: &NodePath) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root, |current, seg| self.child_by_name(current, seg))
    }

    /// All attached nodes advertising `tag`, in pre-order
    #[must_use]
    pub fn find_compatible(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(|n| n.is_compatible(tag)))
            .collect()
    }

    /// A node and all its descendants, in pre-order
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Number of attached nodes, root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.descendants(self.root).len()
    }

    /// A tree always has a root
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ConfigNode, TreeError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    fn require_attached(&self, id: NodeId) -> Result<(), TreeError> {
        if self.node(id).is_none() {
            return Err(TreeError::UnknownNode(id));
        }
        if !self.is_attached(id) {
            return Err(TreeError::NotAttached(id));
        }
        Ok(())
    }

    /// Append a new child under an attached parent
    pub(crate) fn insert_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        validate_node_name(name)?;
        self.require_attached(parent)?;
        if self.child_by_name(parent, name).is_some() {
            return Err(TreeError::NameConflict {
                parent: self.describe(parent),
                name: name.to_string(),
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(ConfigNode::new(name.to_string(), Some(parent))));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Undo [`insert_child`](Self::insert_child): unlink and free the slot
    pub(crate) fn remove_inserted(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.children(id).is_empty() {
            return Err(TreeError::HasChildren(self.describe(id)));
        }
        let parent = self.node(id).ok_or(TreeError::UnknownNode(id))?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|c| *c != id);
        }
        self.nodes[id.0] = None;
        Ok(())
    }

    /// Append a property that must not exist yet
    pub(crate) fn add_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: PropValue,
    ) -> Result<(), TreeError> {
        validate_property_name(name)?;
        self.require_attached(id)?;
        if self.property(id, name).is_some() {
            return Err(TreeError::PropertyExists {
                node: self.describe(id),
                name: name.to_string(),
            });
        }
        self.node_mut(id)?.properties.push(Property {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    /// Replace an existing property in place, returning the previous value
    pub(crate) fn replace_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: PropValue,
    ) -> Result<PropValue, TreeError> {
        self.require_attached(id)?;
        let described = self.describe(id);
        let node = self.node_mut(id)?;
        let prop = node
            .properties
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| TreeError::PropertyMissing {
                node: described,
                name: name.to_string(),
            })?;
        Ok(std::mem::replace(&mut prop.value, value))
    }

    /// Remove a property, returning its value
    pub(crate) fn remove_property(&mut self, id: NodeId, name: &str) -> Result<PropValue, TreeError> {
        let described = self.describe(id);
        let node = self.node_mut(id)?;
        let idx = node
            .properties
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| TreeError::PropertyMissing {
                node: described,
                name: name.to_string(),
            })?;
        Ok(node.properties.remove(idx).value)
    }

    /// Unlink an attached node from its parent, returning `(parent, index)`
    pub(crate) fn detach(&mut self, id: NodeId) -> Result<(NodeId, usize), TreeError> {
        if id == self.root {
            return Err(TreeError::DetachRoot);
        }
        self.require_attached(id)?;
        let parent = self
            .node(id)
            .and_then(ConfigNode::parent)
            .ok_or(TreeError::NotAttached(id))?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|c| *c == id)
            .ok_or(TreeError::NotAttached(id))?;
        siblings.remove(index);
        self.node_mut(id)?.parent = None;
        Ok((parent, index))
    }

    /// Undo [`detach`](Self::detach)
    pub(crate) fn reattach(&mut self, id: NodeId, parent: NodeId, index: usize) -> Result<(), TreeError> {
        let name = self.node(id).ok_or(TreeError::UnknownNode(id))?.name.clone();
        if self.child_by_name(parent, &name).is_some() {
            return Err(TreeError::NameConflict {
                parent: self.describe(parent),
                name,
            });
        }
        let siblings = &mut self.node_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        self.node_mut(id)?.parent = Some(parent);
        Ok(())
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a node name (non-empty, no `/`, no NUL)
///
/// # Errors
/// Returns [`TreeError::InvalidName`] for malformed names
pub fn validate_node_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name.contains(|c| c == '/' || c == '\0') {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Validate a property name (same rules as node names)
///
/// # Errors
/// Returns [`TreeError::InvalidName`] for malformed names
pub fn validate_property_name(name: &str) -> Result<(), TreeError> {
    validate_node_name(name)
}

/// Errors raised by tree mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Slot is empty or out of range
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Node is not reachable from the root
    #[error("node {0} is not attached to the tree")]
    NotAttached(NodeId),

    /// The root cannot be detached
    #[error("the root node cannot be detached")]
    DetachRoot,

    /// Sibling with the same name exists
    #[error("node '{parent}' already has a child named '{name}'")]
    NameConflict { parent: String, name: String },

    /// Property already present
    #[error("node '{node}' already has property '{name}'")]
    PropertyExists { node: String, name: String },

    /// Property not present
    #[error("node '{node}' has no property '{name}'")]
    PropertyMissing { node: String, name: String },

    /// Malformed node or property name
    #[error("invalid name: '{0}'")]
    InvalidName(String),

    /// A staged node reference was used before its creation was applied
    #[error("staged node #{0} was never created")]
    UnresolvedStaged(usize),

    /// Only leaf nodes can be freed
    #[error("node '{0}' still has children")]
    HasChildren(String),
}
