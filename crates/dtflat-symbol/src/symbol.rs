//! Symbol entries and the read view of `/__symbols__`
//!
//! Provides [`SymbolEntry`] (one name → path mapping) and [`SymbolTable`], a
//! read-only view used by later consumers to resolve labels into the tree.

use dtflat_tree::{ConfigTree, NodeId, NodePath, PathError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Name of the symbol table node
pub const SYMBOLS_NODE: &str = "__symbols__";

/// Symbolic name bound to an absolute node path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolEntry {
    /// Label, e.g. `usb_1_hsphy`
    pub name: String,

    /// Absolute path, e.g. `/soc@0/phy@88e3000`
    pub path: String,
}

impl SymbolEntry {
    /// Create new entry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Parse the target path
    ///
    /// # Errors
    /// Returns error if the path is not absolute or malformed
    #[inline]
    pub fn node_path(&self) -> Result<NodePath, PathError> {
        self.path.parse()
    }
}

impl Display for SymbolEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.path)
    }
}

impl<N: Into<String>, P: Into<String>> From<(N, P)> for SymbolEntry {
    fn from((name, path): (N, P)) -> Self {
        Self::new(name, path)
    }
}

/// Locate the symbol table node
///
/// Returns the first attached node named `__symbols__` in pre-order, which
/// is `/__symbols__` when the conventional layout is used.
#[must_use]
pub fn find_symbols_node(tree: &ConfigTree) -> Option<NodeId> {
    tree.child_by_name(tree.root(), SYMBOLS_NODE).or_else(|| {
        tree.descendants(tree.root())
            .into_iter()
            .find(|id| tree.node(*id).is_some_and(|n| n.name() == SYMBOLS_NODE))
    })
}

/// Read-only view of an existing symbol table
#[derive(Debug, Clone)]
pub struct SymbolTable {
    node: NodeId,
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    /// Read the symbol table, if one exists
    ///
    /// Properties whose value is not a single string are ignored.
    #[must_use]
    pub fn read(tree: &ConfigTree) -> Option<Self> {
        let node = find_symbols_node(tree)?;
        let entries = tree
            .node(node)?
            .properties()
            .iter()
            .filter_map(|p| {
                p.value()
                    .as_str()
                    .map(|path| SymbolEntry::new(p.name(), path))
            })
            .collect();
        Some(Self { node, entries })
    }

    /// Node holding the table
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Entries in declaration order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path bound to a label
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.path.as_str())
    }

    /// Resolve a label to a live node
    #[must_use]
    pub fn resolve(&self, tree: &ConfigTree, name: &str) -> Option<NodeId> {
        let path = self.get(name)?.parse().ok()?;
        tree.find_by_path(&path)
    }

    /// Entries whose path does not resolve in `tree`
    #[must_use]
    pub fn dangling<'a>(&'a self, tree: &ConfigTree) -> Vec<&'a SymbolEntry> {
        self.entries
            .iter()
            .filter(|e| {
                e.node_path()
                    .ok()
                    .and_then(|p| tree.find_by_path(&p))
                    .is_none()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtflat_tree::{NodeSnapshot, PropValue, TreeSnapshot};

    fn tree() -> ConfigTree {
        TreeSnapshot::new(
            NodeSnapshot::new("")
                .with_child(NodeSnapshot::new("soc@0").with_child(NodeSnapshot::new("phy@88e3000")))
                .with_child(
                    NodeSnapshot::new(SYMBOLS_NODE)
                        .with_string("usb_1_hsphy", "/soc@0/phy@88e3000")
                        .with_string("gone", "/soc@0/phy@0")
                        .with_property("weird", PropValue::u32(1)),
                ),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn entry_parses_path() {
        let entry = SymbolEntry::new("intc", "/soc@0/interrupt-controller@17a00000");
        assert_eq!(entry.node_path().unwrap().len(), 2);
        assert!(SymbolEntry::new("x", "relative").node_path().is_err());
    }

    #[test]
    fn table_reads_string_entries() {
        let tree = tree();
        let table = SymbolTable::read(&tree).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("usb_1_hsphy"), Some("/soc@0/phy@88e3000"));
        assert_eq!(table.get("weird"), None);
    }

    #[test]
    fn table_resolves_and_reports_dangling() {
        let tree = tree();
        let table = SymbolTable::read(&tree).unwrap();
        let phy = table.resolve(&tree, "usb_1_hsphy").unwrap();
        assert_eq!(tree.describe(phy), "/soc@0/phy@88e3000");
        let dangling = table.dangling(&tree);
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].name, "gone");
    }

    #[test]
    fn missing_table_reads_none() {
        let tree = TreeSnapshot::new(NodeSnapshot::new("")).build().unwrap();
        assert!(SymbolTable::read(&tree).is_none());
        assert!(find_symbols_node(&tree).is_none());
    }
}
