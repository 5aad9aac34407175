//! Symbol table synthesis
//!
//! Stages creation of `/__symbols__` for boards whose tree was built
//! without one. An existing table is never modified.

use crate::symbol::{find_symbols_node, SymbolEntry, SYMBOLS_NODE};
use crate::validation::{SymbolValidator, ValidationError};
use dtflat_tree::{ChangeSet, ConfigTree, StagingError};

/// Label given to change sets produced here
pub const SYMBOLS_CHANGESET: &str = "symbols";

/// Builds the change set that installs a board's symbol table
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolTableSynthesizer {
    limit: Option<usize>,
    validator: SymbolValidator,
}

impl SymbolTableSynthesizer {
    /// Create new synthesizer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of staged edits
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Stage the symbol table for `symbols`
    ///
    /// Returns an empty change set when a symbol table already exists.
    /// Otherwise the set creates `/__symbols__` under the root and adds one
    /// string property per entry, in order. Nothing touches the tree until
    /// the caller commits.
    ///
    /// # Errors
    /// Returns [`SymbolError::Invalid`] for malformed entries and
    /// [`SymbolError::Staging`] when an edit cannot be staged; in both
    /// cases no change set escapes.
    pub fn ensure_symbols(
        &self,
        tree: &ConfigTree,
        symbols: &[SymbolEntry],
    ) -> Result<ChangeSet, SymbolError> {
        let mut changeset = ChangeSet::new(SYMBOLS_CHANGESET).with_optional_limit(self.limit);

        if let Some(existing) = find_symbols_node(tree) {
            tracing::debug!(node = %tree.describe(existing), "symbol table present, leaving it alone");
            return Ok(changeset);
        }

        self.validator.validate(symbols)?;

        let node = changeset.create_node(tree, tree.root(), SYMBOLS_NODE)?;
        for entry in symbols {
            changeset.add_property_string(tree, node, &entry.name, &entry.path)?;
        }

        tracing::debug!(entries = symbols.len(), "staged symbol table");
        Ok(changeset)
    }
}

/// Symbol synthesis errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// Entry list rejected by validation
    #[error("invalid symbol list: {0}")]
    Invalid(#[from] ValidationError),

    /// Edit could not be staged
    #[error("failed to stage symbol table: {0}")]
    Staging(#[from] StagingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtflat_tree::{Edit, NodeSnapshot, TreeSnapshot};

    fn bare() -> ConfigTree {
        TreeSnapshot::new(NodeSnapshot::new("").with_child(NodeSnapshot::new("soc@0")))
            .build()
            .unwrap()
    }

    fn symbols() -> Vec<SymbolEntry> {
        vec![
            SymbolEntry::new("usb_1", "/soc@0/usb@a6f8800"),
            SymbolEntry::new("usb_1_dwc3", "/soc@0/usb@a6f8800/usb@a600000"),
        ]
    }

    #[test]
    fn stages_node_and_entries_in_order() {
        let tree = bare();
        let cs = SymbolTableSynthesizer::new()
            .ensure_symbols(&tree, &symbols())
            .unwrap();
        assert_eq!(cs.len(), 3);
        assert!(matches!(&cs.edits()[0], Edit::CreateNode { name, .. } if name == SYMBOLS_NODE));
        assert!(matches!(&cs.edits()[2], Edit::AddProperty { name, .. } if name == "usb_1_dwc3"));
        assert!(find_symbols_node(&tree).is_none());
    }

    #[test]
    fn existing_table_yields_empty_set() {
        let tree = TreeSnapshot::new(
            NodeSnapshot::new("").with_child(NodeSnapshot::new(SYMBOLS_NODE).with_string("x", "/")),
        )
        .build()
        .unwrap();
        let cs = SymbolTableSynthesizer::new()
            .ensure_symbols(&tree, &symbols())
            .unwrap();
        assert!(cs.is_empty());
    }

    #[test]
    fn limit_aborts_staging() {
        let tree = bare();
        let err = SymbolTableSynthesizer::new()
            .with_limit(Some(2))
            .ensure_symbols(&tree, &symbols())
            .unwrap_err();
        assert_eq!(err, SymbolError::Staging(StagingError::Exhausted { limit: 2 }));
    }

    #[test]
    fn invalid_entries_are_rejected() {
        let tree = bare();
        let err = SymbolTableSynthesizer::new()
            .ensure_symbols(&tree, &[SymbolEntry::new("x", "relative")])
            .unwrap_err();
        assert!(matches!(err, SymbolError::Invalid(_)));
    }
}
