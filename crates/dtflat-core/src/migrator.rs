//! Legacy subtree relocation
//!
//! A legacy glue node wraps the real controller in a child node. Flattening
//! promotes a filtered set of controller properties onto the glue node,
//! clones the controller's `ports` subtree under the glue node, and detaches
//! the controller. Everything is staged into a caller-owned [`ChangeSet`];
//! nothing is visible until that set is committed.

use dtflat_tree::{ChangeSet, ConfigTree, NodeId, NodeRef, StagingError};
use serde::{Deserialize, Serialize};

/// What gets moved, and what identifies the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationRules {
    /// Compatible tag of the embedded controller child
    pub controller_compatible: String,

    /// Property name prefixes promoted to the glue node
    pub promoted_prefixes: Vec<String>,

    /// Exact property names promoted to the glue node
    pub promoted_properties: Vec<String>,

    /// Child of the controller that is cloned wholesale
    pub ports_node: String,
}

impl Default for MigrationRules {
    fn default() -> Self {
        Self {
            controller_compatible: "snps,dwc3".to_string(),
            promoted_prefixes: vec!["snps,".to_string()],
            promoted_properties: vec![
                "usb-role-switch".to_string(),
                "dr_mode".to_string(),
                "tx-fifo-resize".to_string(),
                "maximum-speed".to_string(),
            ],
            ports_node: "ports".to_string(),
        }
    }
}

impl MigrationRules {
    /// Check whether a controller property moves to the glue node
    #[must_use]
    pub fn is_promoted(&self, name: &str) -> bool {
        self.promoted_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.promoted_properties.iter().any(|p| p == name)
    }
}

/// Result of migrating one glue node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStep {
    /// No controller child; nothing staged
    Skipped,

    /// Edits staged
    Migrated {
        /// Controller being removed
        controller: NodeId,
        /// Names of promoted properties, in controller order
        promoted: Vec<String>,
        /// Nodes created by cloning `ports`
        cloned_nodes: usize,
    },
}

/// Stages the flattening of legacy glue nodes
#[derive(Debug, Clone, Default)]
pub struct SubtreeMigrator {
    rules: MigrationRules,
}

impl SubtreeMigrator {
    /// Create migrator with the given rules
    #[inline]
    #[must_use]
    pub fn new(rules: MigrationRules) -> Self {
        Self { rules }
    }

    /// Rules in use
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &MigrationRules {
        &self.rules
    }

    /// Stage the flattening of `node` into `changeset`
    ///
    /// Order of staged edits: promoted properties, the `ports` clone (each
    /// original node detached after its copy and all its descendants are
    /// staged), then the controller detach.
    ///
    /// # Errors
    /// Propagates the first staging failure. Edits staged before the failure
    /// stay in `changeset`; callers discard the whole set.
    pub fn migrate(
        &self,
        changeset: &mut ChangeSet,
        tree: &ConfigTree,
        node: NodeId,
    ) -> Result<MigrationStep, StagingError> {
        let Some(controller) = tree.compatible_child(node, &self.rules.controller_compatible) else {
            tracing::debug!(node = %tree.describe(node), "no controller child, skipping");
            return Ok(MigrationStep::Skipped);
        };

        let promoted = self.promote_properties(changeset, tree, node, controller)?;

        let mut cloned_nodes = 0;
        if let Some(ports) = tree.child_by_name(controller, &self.rules.ports_node) {
            cloned_nodes = clone_subtree(changeset, tree, NodeRef::Live(node), ports)?;
        }

        changeset.detach_node(tree, controller)?;

        tracing::debug!(
            node = %tree.describe(node),
            controller = %tree.describe(controller),
            promoted = promoted.len(),
            cloned_nodes,
            "staged flattening"
        );
        Ok(MigrationStep::Migrated {
            controller,
            promoted,
            cloned_nodes,
        })
    }

    fn promote_properties(
        &self,
        changeset: &mut ChangeSet,
        tree: &ConfigTree,
        node: NodeId,
        controller: NodeId,
    ) -> Result<Vec<String>, StagingError> {
        let mut promoted = Vec::new();
        let Some(source) = tree.node(controller) else {
            return Ok(promoted);
        };
        for prop in source.properties() {
            if !self.rules.is_promoted(prop.name()) {
                continue;
            }
            changeset.add_property(tree, node, prop.name(), prop.value().clone())?;
            promoted.push(prop.name().to_string());
        }
        Ok(promoted)
    }
}

/// Clone `original` under `parent` with all properties and descendants,
/// then stage its detachment. Returns the number of nodes created.
fn clone_subtree(
    changeset: &mut ChangeSet,
    tree: &ConfigTree,
    parent: NodeRef,
    original: NodeId,
) -> Result<usize, StagingError> {
    let Some(source) = tree.node(original) else {
        return Err(StagingError::UnknownTarget(NodeRef::Live(original)));
    };

    let copy = changeset.create_node(tree, parent, source.name())?;
    for prop in source.properties() {
        changeset.add_property(tree, copy, prop.name(), prop.value().clone())?;
    }

    let mut created = 1;
    for child in source.children() {
        created += clone_subtree(changeset, tree, copy, *child)?;
    }

    changeset.detach_node(tree, original)?;
    Ok(created)
}
