//! Overlay application
//!
//! The orchestrator talks to overlays only through [`OverlayApplier`].
//! [`FragmentOverlayApplier`] is the in-tree implementation: a blob is a
//! JSON [`OverlayDocument`] whose fragments are merged into the tree through
//! change sets, one per fragment, and removed by reverting them.

use crate::descriptor::OverlayBlob;
use dtflat_symbol::SymbolTable;
use dtflat_tree::{
    ChangeSet, ChangeSetError, CommitError, ConfigTree, NodeId, NodePath, NodeRef, NodeSnapshot,
    StagingError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Identifies an applied (or partially applied) overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayHandle(u64);

impl OverlayHandle {
    /// Create from a raw id
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl Display for OverlayHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Applies and removes overlays
pub trait OverlayApplier {
    /// Apply `blob` to `tree`
    ///
    /// # Errors
    /// On failure the returned [`OverlayFailure`] carries a handle if part
    /// of the overlay was left applied; the caller must remove it.
    fn apply(
        &mut self,
        tree: &mut ConfigTree,
        blob: &OverlayBlob,
    ) -> Result<OverlayHandle, OverlayFailure>;

    /// Remove a previously applied overlay
    ///
    /// # Errors
    /// Returns error if the handle is unknown or the tree refuses the
    /// inverse edits.
    fn remove(&mut self, tree: &mut ConfigTree, handle: OverlayHandle) -> Result<(), OverlayError>;
}

impl<A: OverlayApplier + ?Sized> OverlayApplier for &mut A {
    fn apply(
        &mut self,
        tree: &mut ConfigTree,
        blob: &OverlayBlob,
    ) -> Result<OverlayHandle, OverlayFailure> {
        (**self).apply(tree, blob)
    }

    fn remove(&mut self, tree: &mut ConfigTree, handle: OverlayHandle) -> Result<(), OverlayError> {
        (**self).remove(tree, handle)
    }
}

/// Target prefix selecting every attached node with a compatible tag
pub const COMPATIBLE_TARGET_PREFIX: &str = "compatible:";

/// One overlay fragment
///
/// `target` is an absolute path, `&label` resolved through `/__symbols__`,
/// or `compatible:<tag>` selecting every attached node carrying `<tag>`
/// (in tree order; at least one must exist). The `node` description is
/// merged into each target: existing properties are replaced, new ones
/// appended, children merged by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayFragment {
    /// Target node
    pub target: String,

    /// Content merged into the target (its name is ignored)
    #[serde(default)]
    pub node: NodeSnapshot,
}

impl OverlayFragment {
    /// Create new fragment
    #[must_use]
    pub fn new(target: impl Into<String>, node: NodeSnapshot) -> Self {
        Self {
            target: target.into(),
            node,
        }
    }
}

/// Serialized form of a fragment overlay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayDocument {
    /// Fragments, applied in order
    #[serde(default)]
    pub fragments: Vec<OverlayFragment>,
}

impl OverlayDocument {
    /// Create document from fragments
    #[must_use]
    pub fn new(fragments: Vec<OverlayFragment>) -> Self {
        Self { fragments }
    }

    /// Decode a blob
    ///
    /// # Errors
    /// Returns error if the blob is not a valid JSON document
    pub fn decode(blob: &OverlayBlob) -> Result<Self, OverlayError> {
        serde_json::from_slice(blob.as_bytes()).map_err(OverlayError::Decode)
    }

    /// Encode into a blob
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn encode(&self) -> Result<OverlayBlob, OverlayError> {
        serde_json::to_vec(self)
            .map(OverlayBlob::new)
            .map_err(OverlayError::Decode)
    }
}

/// Applies [`OverlayDocument`] blobs through change sets
#[derive(Debug, Default)]
pub struct FragmentOverlayApplier {
    next_id: u64,
    limit: Option<usize>,
    applied: BTreeMap<OverlayHandle, Vec<ChangeSet>>,
}

impl FragmentOverlayApplier {
    /// Create new applier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of staged edits per fragment
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Number of overlays currently applied
    #[inline]
    #[must_use]
    pub fn applied(&self) -> usize {
        self.applied.len()
    }

    /// Check whether `handle` is applied
    #[inline]
    #[must_use]
    pub fn is_applied(&self, handle: OverlayHandle) -> bool {
        self.applied.contains_key(&handle)
    }

    fn apply_fragment(
        &self,
        tree: &mut ConfigTree,
        index: usize,
        fragment: &OverlayFragment,
    ) -> Result<ChangeSet, OverlayError> {
        let targets = resolve_targets(tree, &fragment.target)?;
        let mut changeset =
            ChangeSet::new(format!("overlay-fragment-{index}")).with_optional_limit(self.limit);
        for &target in &targets {
            stage_merge(&mut changeset, tree, NodeRef::Live(target), Some(target), &fragment.node)?;
        }
        changeset.commit(tree)?;
        tracing::debug!(
            fragment = index,
            target = %fragment.target,
            nodes = targets.len(),
            edits = changeset.len(),
            "fragment applied"
        );
        Ok(changeset)
    }
}

impl OverlayApplier for FragmentOverlayApplier {
    fn apply(
        &mut self,
        tree: &mut ConfigTree,
        blob: &OverlayBlob,
    ) -> Result<OverlayHandle, OverlayFailure> {
        let document = OverlayDocument::decode(blob).map_err(OverlayFailure::new)?;
        let handle = OverlayHandle::new(self.next_id);
        self.next_id += 1;

        let mut committed = Vec::with_capacity(document.fragments.len());
        for (index, fragment) in document.fragments.iter().enumerate() {
            match self.apply_fragment(tree, index, fragment) {
                Ok(changeset) => committed.push(changeset),
                Err(error) if committed.is_empty() => return Err(OverlayFailure::new(error)),
                Err(error) => {
                    self.applied.insert(handle, committed);
                    return Err(OverlayFailure::partial(handle, error));
                }
            }
        }

        self.applied.insert(handle, committed);
        Ok(handle)
    }

    fn remove(&mut self, tree: &mut ConfigTree, handle: OverlayHandle) -> Result<(), OverlayError> {
        let mut changesets = self
            .applied
            .remove(&handle)
            .ok_or(OverlayError::UnknownHandle(handle))?;
        while let Some(mut changeset) = changesets.pop() {
            if let Err(err) = changeset.revert(tree) {
                changesets.push(changeset);
                self.applied.insert(handle, changesets);
                return Err(err.into());
            }
        }
        tracing::debug!(%handle, "overlay removed");
        Ok(())
    }
}

fn resolve_targets(tree: &ConfigTree, target: &str) -> Result<Vec<NodeId>, OverlayError> {
    if let Some(label) = target.strip_prefix('&') {
        return SymbolTable::read(tree)
            .and_then(|table| table.resolve(tree, label))
            .map(|id| vec![id])
            .ok_or_else(|| OverlayError::UnknownSymbol(label.to_string()));
    }
    if let Some(tag) = target.strip_prefix(COMPATIBLE_TARGET_PREFIX) {
        let matches = tree.find_compatible(tag);
        if matches.is_empty() {
            return Err(OverlayError::UnresolvedTarget(target.to_string()));
        }
        return Ok(matches);
    }
    let path: NodePath = target
        .parse()
        .map_err(|_| OverlayError::UnresolvedTarget(target.to_string()))?;
    tree.find_by_path(&path)
        .map(|id| vec![id])
        .ok_or_else(|| OverlayError::UnresolvedTarget(target.to_string()))
}

/// Stage `node` merged into `at`; `live` is the existing node, if any.
fn stage_merge(
    changeset: &mut ChangeSet,
    tree: &ConfigTree,
    at: NodeRef,
    live: Option<NodeId>,
    node: &NodeSnapshot,
) -> Result<(), StagingError> {
    for (name, value) in &node.properties {
        if live.is_some_and(|id| tree.property(id, name).is_some()) {
            changeset.update_property(tree, at, name, value.clone())?;
        } else {
            changeset.add_property(tree, at, name, value.clone())?;
        }
    }
    for child in &node.children {
        let existing = live.and_then(|id| tree.child_by_name(id, &child.name));
        let child_ref = match existing {
            Some(id) => NodeRef::Live(id),
            None => changeset.create_node(tree, at, &child.name)?,
        };
        stage_merge(changeset, tree, child_ref, existing, child)?;
    }
    Ok(())
}

/// Failed overlay application
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct OverlayFailure {
    /// Handle of the partially applied overlay, if any
    pub handle: Option<OverlayHandle>,

    /// Cause
    #[source]
    pub error: OverlayError,
}

impl OverlayFailure {
    /// Failure with nothing left applied
    #[must_use]
    pub fn new(error: OverlayError) -> Self {
        Self {
            handle: None,
            error,
        }
    }

    /// Failure that left part of the overlay applied
    #[must_use]
    pub fn partial(handle: OverlayHandle, error: OverlayError) -> Self {
        Self {
            handle: Some(handle),
            error,
        }
    }
}

/// Overlay errors
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// Blob is not a valid overlay document
    #[error("invalid overlay document: {0}")]
    Decode(#[source] serde_json::Error),

    /// Fragment target path does not exist, or no node has the compatible
    #[error("overlay target not found: {0}")]
    UnresolvedTarget(String),

    /// Fragment target label is not in the symbol table
    #[error("overlay target symbol not found: &{0}")]
    UnknownSymbol(String),

    /// Fragment could not be staged
    #[error("failed to stage overlay fragment: {0}")]
    Staging(#[from] StagingError),

    /// Fragment could not be committed
    #[error("failed to commit overlay fragment: {0}")]
    Commit(#[from] CommitError),

    /// Fragment could not be reverted
    #[error("failed to revert overlay fragment: {0}")]
    Revert(#[from] ChangeSetError),

    /// Handle does not name an applied overlay
    #[error("unknown overlay handle: {0}")]
    UnknownHandle(OverlayHandle),

    /// Applier refused the overlay
    #[error("overlay rejected: {0}")]
    Rejected(String),
}
