//! Serializable tree snapshots
//!
//! Provides [`TreeSnapshot`] and [`NodeSnapshot`], an owned, order-preserving
//! description of a tree. Hosts build the initial [`ConfigTree`] from a
//! snapshot; tests and tools compare snapshots to check structural equality.

use crate::path::NodePath;
use crate::tree::{ConfigTree, NodeId, TreeError, COMPATIBLE};
use crate::value::PropValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Owned description of one node and its subtree
///
/// Equality is order-sensitive for both properties and children.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node name (empty for the root)
    #[serde(default)]
    pub name: String,

    /// Properties in order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropValue>,

    /// Children in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl PartialEq for NodeSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.properties.iter().eq(other.properties.iter())
            && self.children == other.children
    }
}

impl NodeSnapshot {
    /// Create an empty node
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With a property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// With a string property
    #[must_use]
    pub fn with_string(self, name: impl Into<String>, value: &str) -> Self {
        self.with_property(name, PropValue::string(value))
    }

    /// With an empty (boolean) property
    #[must_use]
    pub fn with_flag(self, name: impl Into<String>) -> Self {
        self.with_property(name, PropValue::empty())
    }

    /// With a `compatible` string list
    #[must_use]
    pub fn with_compatible<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_property(COMPATIBLE, PropValue::string_list(tags))
    }

    /// With a child node
    #[must_use]
    pub fn with_child(mut self, child: NodeSnapshot) -> Self {
        self.children.push(child);
        self
    }

    /// Direct child by name
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&NodeSnapshot> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Descend along a path relative to this node
    #[must_use]
    pub fn at(&self, path: &NodePath) -> Option<&NodeSnapshot> {
        path.iter().try_fold(self, |node, seg| node.child(seg))
    }

    fn capture(tree: &ConfigTree, id: NodeId) -> Self {
        let Some(node) = tree.node(id) else {
            return Self::default();
        };
        Self {
            name: node.name().to_string(),
            properties: node
                .properties()
                .iter()
                .map(|p| (p.name().to_string(), p.value().clone()))
                .collect(),
            children: node
                .children()
                .iter()
                .map(|c| Self::capture(tree, *c))
                .collect(),
        }
    }

    fn build_into(&self, tree: &mut ConfigTree, id: NodeId) -> Result<(), TreeError> {
        for (name, value) in &self.properties {
            tree.add_property(id, name, value.clone())?;
        }
        for child in &self.children {
            let child_id = tree.insert_child(id, &child.name)?;
            child.build_into(tree, child_id)?;
        }
        Ok(())
    }
}

/// Owned description of a whole tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Root node
    pub root: NodeSnapshot,
}

impl TreeSnapshot {
    /// Wrap a root node description
    #[inline]
    #[must_use]
    pub fn new(root: NodeSnapshot) -> Self {
        Self { root }
    }

    /// Capture the attached part of a tree
    #[must_use]
    pub fn capture(tree: &ConfigTree) -> Self {
        Self {
            root: NodeSnapshot::capture(tree, tree.root()),
        }
    }

    /// Build a fresh tree
    ///
    /// # Errors
    /// Returns error on duplicate sibling names, duplicate properties or
    /// invalid names
    pub fn build(&self) -> Result<ConfigTree, TreeError> {
        let mut tree = ConfigTree::new();
        let root = tree.root();
        self.root.build_into(&mut tree, root)?;
        Ok(tree)
    }

    /// Node description at an absolute path
    #[must_use]
    pub fn at(&self, path: &NodePath) -> Option<&NodeSnapshot> {
        self.root.at(path)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(SnapshotError::Json)
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns error if YAML is invalid
    pub fn from_yaml(yaml: &str) -> Result<Self, SnapshotError> {
        serde_yaml::from_str(yaml).map_err(SnapshotError::Yaml)
    }

    /// Pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Json)
    }

    /// YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, SnapshotError> {
        serde_yaml::to_string(self).map_err(SnapshotError::Yaml)
    }
}

impl ConfigTree {
    /// Capture the attached part of the tree
    #[must_use]
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::capture(self)
    }
}

/// Snapshot (de)serialization errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// JSON error
    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// YAML error
    #[error("invalid YAML: {0}")]
    Yaml(#[source] serde_yaml::Error),
}
