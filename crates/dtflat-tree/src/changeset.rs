//! Transactional change sets
//!
//! Provides [`ChangeSet`], an ordered list of staged tree edits that is
//! committed atomically, reverted exactly, or destroyed unapplied.
//!
//! Edits are validated against the live tree while staging but nothing is
//! mutated until [`ChangeSet::commit`]. Commit applies edits in order and
//! records an undo journal; if any edit fails, the already-applied prefix is
//! unwound before returning, so a failed commit has no observable effect.
//! [`ChangeSet::revert`] replays the journal backwards, restoring topology,
//! property contents and ordering.

use crate::tree::{validate_node_name, validate_property_name, ConfigTree, NodeId, TreeError};
use crate::value::PropValue;
use std::fmt::{self, Display, Formatter};

/// Target of a staged edit
///
/// Edits may address live nodes or nodes created earlier in the same
/// change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// Node present in the tree when the edit was staged
    Live(NodeId),

    /// N-th node created by this change set
    Staged(usize),
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(id) => write!(f, "{id}"),
            Self::Staged(n) => write!(f, "staged#{n}"),
        }
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        Self::Live(id)
    }
}

/// A staged tree edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Append a new child under `parent`
    CreateNode { parent: NodeRef, name: String },

    /// Add a property that must not exist yet
    AddProperty {
        node: NodeRef,
        name: String,
        value: PropValue,
    },

    /// Replace the value of an existing property
    UpdateProperty {
        node: NodeRef,
        name: String,
        value: PropValue,
    },

    /// Unlink a live node (and its subtree) from the tree
    DetachNode { node: NodeId },
}

impl Edit {
    /// Short operation name for logs
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateNode { .. } => "create-node",
            Self::AddProperty { .. } => "add-property",
            Self::UpdateProperty { .. } => "update-property",
            Self::DetachNode { .. } => "detach-node",
        }
    }
}

/// Lifecycle state of a change set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeSetState {
    /// Accepting edits; nothing applied
    Staging,

    /// All edits applied to the tree
    Committed,

    /// Committed, then undone
    Reverted,
}

impl Display for ChangeSetState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Staging => "staging",
            Self::Committed => "committed",
            Self::Reverted => "reverted",
        };
        f.write_str(s)
    }
}

/// Undo record for one applied edit
#[derive(Debug, Clone)]
enum Applied {
    Created { id: NodeId },
    PropertyAdded { node: NodeId, name: String },
    PropertyUpdated { node: NodeId, name: String, previous: PropValue },
    Detached { node: NodeId, parent: NodeId, index: usize },
}

/// Ordered, atomically committable set of tree edits
#[derive(Debug, Clone)]
pub struct ChangeSet {
    label: String,
    edits: Vec<Edit>,
    staged_nodes: usize,
    limit: Option<usize>,
    state: ChangeSetState,
    journal: Vec<Applied>,
}

impl ChangeSet {
    /// Create an empty change set
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            edits: Vec::new(),
            staged_nodes: 0,
            limit: None,
            state: ChangeSetState::Staging,
            journal: Vec::new(),
        }
    }

    /// Cap the number of staged edits
    ///
    /// Staging beyond the cap fails with [`StagingError::Exhausted`], the
    /// equivalent of an allocation failure while building the set.
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply an optional cap
    #[inline]
    #[must_use]
    pub fn with_optional_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Label used in logs and errors
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Staged edits, in order
    #[inline]
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Number of staged edits
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Check if nothing is staged
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ChangeSetState {
        self.state
    }

    /// Stage creation of a child node
    ///
    /// # Errors
    /// Fails if the set is closed, the limit is reached, the name is invalid
    /// or the parent does not resolve.
    pub fn create_node(
        &mut self,
        tree: &ConfigTree,
        parent: impl Into<NodeRef>,
        name: &str,
    ) -> Result<NodeRef, StagingError> {
        let parent = parent.into();
        self.check_open()?;
        validate_node_name(name)?;
        self.check_target(tree, parent)?;
        self.push(Edit::CreateNode {
            parent,
            name: name.to_string(),
        })?;
        let created = NodeRef::Staged(self.staged_nodes);
        self.staged_nodes += 1;
        Ok(created)
    }

    /// Stage a property copy onto a node
    ///
    /// # Errors
    /// Fails if the set is closed, the limit is reached, the name is invalid
    /// or the node does not resolve.
    pub fn add_property(
        &mut self,
        tree: &ConfigTree,
        node: impl Into<NodeRef>,
        name: &str,
        value: PropValue,
    ) -> Result<(), StagingError> {
        let node = node.into();
        self.check_open()?;
        validate_property_name(name)?;
        self.check_target(tree, node)?;
        self.push(Edit::AddProperty {
            node,
            name: name.to_string(),
            value,
        })
    }

    /// Stage a string property
    ///
    /// # Errors
    /// See [`add_property`](Self::add_property).
    pub fn add_property_string(
        &mut self,
        tree: &ConfigTree,
        node: impl Into<NodeRef>,
        name: &str,
        value: &str,
    ) -> Result<(), StagingError> {
        self.add_property(tree, node, name, PropValue::string(value))
    }

    /// Stage replacement of an existing property value
    ///
    /// # Errors
    /// See [`add_property`](Self::add_property).
    pub fn update_property(
        &mut self,
        tree: &ConfigTree,
        node: impl Into<NodeRef>,
        name: &str,
        value: PropValue,
    ) -> Result<(), StagingError> {
        let node = node.into();
        self.check_open()?;
        validate_property_name(name)?;
        self.check_target(tree, node)?;
        self.push(Edit::UpdateProperty {
            node,
            name: name.to_string(),
            value,
        })
    }

    /// Stage detachment of a live node
    ///
    /// # Errors
    /// Fails if the set is closed, the limit is reached, the node is the root
    /// or is not attached.
    pub fn detach_node(&mut self, tree: &ConfigTree, node: NodeId) -> Result<(), StagingError> {
        self.check_open()?;
        if node == tree.root() {
            return Err(StagingError::Tree(TreeError::DetachRoot));
        }
        self.check_target(tree, NodeRef::Live(node))?;
        self.push(Edit::DetachNode { node })
    }

    /// Apply all staged edits atomically
    ///
    /// # Errors
    /// Returns the first failing edit; the tree is left exactly as before.
    pub fn commit(&mut self, tree: &mut ConfigTree) -> Result<(), CommitError> {
        if self.state != ChangeSetState::Staging {
            return Err(CommitError::InvalidState(self.state));
        }

        let mut created: Vec<NodeId> = Vec::with_capacity(self.staged_nodes);
        let mut journal: Vec<Applied> = Vec::with_capacity(self.edits.len());

        for (index, edit) in self.edits.iter().enumerate() {
            match apply_edit(tree, edit, &created, &mut journal) {
                Ok(Some(id)) => created.push(id),
                Ok(None) => {}
                Err(source) => {
                    tracing::debug!(
                        changeset = %self.label,
                        index,
                        op = edit.kind(),
                        error = %source,
                        "commit failed, unwinding applied prefix"
                    );
                    if let Err(undo) = undo_journal(tree, &mut journal) {
                        return Err(CommitError::Unwind { index, source, undo });
                    }
                    return Err(CommitError::Edit { index, source });
                }
            }
        }

        tracing::debug!(changeset = %self.label, edits = self.edits.len(), "committed");
        self.journal = journal;
        self.state = ChangeSetState::Committed;
        Ok(())
    }

    /// Undo a committed change set
    ///
    /// # Errors
    /// Fails if the set is not committed or the tree no longer accepts the
    /// inverse edits.
    pub fn revert(&mut self, tree: &mut ConfigTree) -> Result<(), ChangeSetError> {
        if self.state != ChangeSetState::Committed {
            return Err(ChangeSetError::InvalidState(self.state));
        }
        undo_journal(tree, &mut self.journal).map_err(ChangeSetError::Undo)?;
        tracing::debug!(changeset = %self.label, "reverted");
        self.state = ChangeSetState::Reverted;
        Ok(())
    }

    /// Discard the change set, returning how many staged edits were dropped
    ///
    /// Destroying a committed set keeps its effects but gives up the ability
    /// to revert them.
    pub fn destroy(self) -> usize {
        tracing::trace!(changeset = %self.label, state = %self.state, "destroyed");
        self.edits.len()
    }

    fn check_open(&self) -> Result<(), StagingError> {
        if self.state == ChangeSetState::Staging {
            Ok(())
        } else {
            Err(StagingError::Closed(self.state))
        }
    }

    fn check_target(&self, tree: &ConfigTree, target: NodeRef) -> Result<(), StagingError> {
        match target {
            NodeRef::Live(id) => {
                if tree.node(id).is_none() {
                    Err(StagingError::UnknownTarget(target))
                } else if !tree.is_attached(id) {
                    Err(StagingError::Tree(TreeError::NotAttached(id)))
                } else {
                    Ok(())
                }
            }
            NodeRef::Staged(n) if n < self.staged_nodes => Ok(()),
            NodeRef::Staged(_) => Err(StagingError::UnknownTarget(target)),
        }
    }

    fn push(&mut self, edit: Edit) -> Result<(), StagingError> {
        if let Some(limit) = self.limit {
            if self.edits.len() >= limit {
                return Err(StagingError::Exhausted { limit });
            }
        }
        self.edits.push(edit);
        Ok(())
    }
}

fn resolve(target: NodeRef, created: &[NodeId]) -> Result<NodeId, TreeError> {
    match target {
        NodeRef::Live(id) => Ok(id),
        NodeRef::Staged(n) => created
            .get(n)
            .copied()
            .ok_or(TreeError::UnresolvedStaged(n)),
    }
}

fn apply_edit(
    tree: &mut ConfigTree,
    edit: &Edit,
    created: &[NodeId],
    journal: &mut Vec<Applied>,
) -> Result<Option<NodeId>, TreeError> {
    match edit {
        Edit::CreateNode { parent, name } => {
            let parent = resolve(*parent, created)?;
            let id = tree.insert_child(parent, name)?;
            journal.push(Applied::Created { id });
            Ok(Some(id))
        }
        Edit::AddProperty { node, name, value } => {
            let node = resolve(*node, created)?;
            tree.add_property(node, name, value.clone())?;
            journal.push(Applied::PropertyAdded {
                node,
                name: name.clone(),
            });
            Ok(None)
        }
        Edit::UpdateProperty { node, name, value } => {
            let node = resolve(*node, created)?;
            let previous = tree.replace_property(node, name, value.clone())?;
            journal.push(Applied::PropertyUpdated {
                node,
                name: name.clone(),
                previous,
            });
            Ok(None)
        }
        Edit::DetachNode { node } => {
            let (parent, index) = tree.detach(*node)?;
            journal.push(Applied::Detached {
                node: *node,
                parent,
                index,
            });
            Ok(None)
        }
    }
}

/// Pop and invert journal entries until empty
fn undo_journal(tree: &mut ConfigTree, journal: &mut Vec<Applied>) -> Result<(), TreeError> {
    while let Some(entry) = journal.pop() {
        match entry {
            Applied::Created { id } => tree.remove_inserted(id)?,
            Applied::PropertyAdded { node, name } => {
                tree.remove_property(node, &name)?;
            }
            Applied::PropertyUpdated {
                node,
                name,
                previous,
            } => {
                tree.replace_property(node, &name, previous)?;
            }
            Applied::Detached {
                node,
                parent,
                index,
            } => tree.reattach(node, parent, index)?,
        }
    }
    Ok(())
}

/// Errors while staging edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    /// Staged-edit limit reached
    #[error("change set exhausted after {limit} edits")]
    Exhausted { limit: usize },

    /// Target does not resolve
    #[error("unknown edit target: {0}")]
    UnknownTarget(NodeRef),

    /// Change set no longer accepts edits
    #[error("change set is {0}, not staging")]
    Closed(ChangeSetState),

    /// Structural problem with the target
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors while committing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// Edit `index` failed; the tree is unchanged
    #[error("edit {index} failed: {source}")]
    Edit { index: usize, source: TreeError },

    /// Edit `index` failed and unwinding the applied prefix also failed
    #[error("edit {index} failed ({source}) and unwinding failed: {undo}")]
    Unwind {
        index: usize,
        source: TreeError,
        undo: TreeError,
    },

    /// Change set is not in the staging state
    #[error("cannot commit a change set that is {0}")]
    InvalidState(ChangeSetState),
}

/// Errors while reverting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeSetError {
    /// Change set is not committed
    #[error("cannot revert a change set that is {0}")]
    InvalidState(ChangeSetState),

    /// An inverse edit failed
    #[error("revert failed: {0}")]
    Undo(TreeError),
}
