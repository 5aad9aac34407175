//! Board descriptors and the descriptor table
//!
//! A [`BoardDescriptor`] ties a board identity (a root `compatible` tag) to
//! the legacy compatible that marks unmigrated glue nodes, the symbols the
//! board's overlay depends on, and the overlay itself. [`DescriptorTable`]
//! holds descriptors sorted by identity for exact lookup.

use dtflat_symbol::SymbolEntry;
use dtflat_tree::ConfigTree;
use std::fmt;

/// Opaque overlay payload handed to an overlay applier
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct OverlayBlob(Vec<u8>);

impl OverlayBlob {
    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the blob is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for OverlayBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OverlayBlob({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for OverlayBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for OverlayBlob {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<String> for OverlayBlob {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

/// Everything needed to migrate one board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardDescriptor {
    identity: String,
    legacy_match: String,
    symbols: Vec<SymbolEntry>,
    overlay: OverlayBlob,
}

impl BoardDescriptor {
    /// Create new descriptor with no symbols and an empty overlay
    #[must_use]
    pub fn new(identity: impl Into<String>, legacy_match: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            legacy_match: legacy_match.into(),
            symbols: Vec::new(),
            overlay: OverlayBlob::default(),
        }
    }

    /// With one symbol appended
    #[must_use]
    pub fn with_symbol(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.symbols.push(SymbolEntry::new(name, path));
        self
    }

    /// With symbols appended in order
    #[must_use]
    pub fn with_symbols<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SymbolEntry>,
    {
        self.symbols.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// With overlay payload
    #[must_use]
    pub fn with_overlay(mut self, overlay: impl Into<OverlayBlob>) -> Self {
        self.overlay = overlay.into();
        self
    }

    /// Root `compatible` tag this descriptor is keyed by
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Compatible tag of unmigrated glue nodes
    #[inline]
    #[must_use]
    pub fn legacy_match(&self) -> &str {
        &self.legacy_match
    }

    /// Symbols the overlay refers to, in order
    #[inline]
    #[must_use]
    pub fn symbols(&self) -> &[SymbolEntry] {
        &self.symbols
    }

    /// Overlay payload
    #[inline]
    #[must_use]
    pub fn overlay(&self) -> &OverlayBlob {
        &self.overlay
    }
}

/// Descriptors sorted by identity
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    entries: Vec<BoardDescriptor>,
}

impl DescriptorTable {
    /// Build a table
    ///
    /// # Errors
    /// Returns error on duplicate identities or empty keys
    pub fn new(mut descriptors: Vec<BoardDescriptor>) -> Result<Self, DescriptorError> {
        for d in &descriptors {
            if d.identity.is_empty() {
                return Err(DescriptorError::EmptyIdentity);
            }
            if d.legacy_match.is_empty() {
                return Err(DescriptorError::EmptyLegacyMatch(d.identity.clone()));
            }
        }

        descriptors.sort_by(|a, b| a.identity.cmp(&b.identity));
        if let Some(pair) = descriptors
            .windows(2)
            .find(|w| w[0].identity == w[1].identity)
        {
            return Err(DescriptorError::DuplicateIdentity(pair[0].identity.clone()));
        }

        Ok(Self {
            entries: descriptors,
        })
    }

    /// Exact lookup by identity
    #[must_use]
    pub fn lookup(&self, identity: &str) -> Option<&BoardDescriptor> {
        self.entries
            .binary_search_by(|d| d.identity.as_str().cmp(identity))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Descriptor for the board described by `tree`
    ///
    /// The root's `compatible` tags are tried most specific first; the first
    /// tag with a descriptor wins.
    #[must_use]
    pub fn select(&self, tree: &ConfigTree) -> Option<&BoardDescriptor> {
        tree.node(tree.root())?
            .compatible()
            .into_iter()
            .find_map(|tag| self.lookup(tag))
    }

    /// Descriptors in identity order
    pub fn iter(&self) -> impl Iterator<Item = &BoardDescriptor> {
        self.entries.iter()
    }

    /// Number of descriptors
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
}

/// Descriptor table construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// Two descriptors share an identity
    #[error("duplicate board identity: {0}")]
    DuplicateIdentity(String),

    /// Descriptor without identity
    #[error("board descriptor with empty identity")]
    EmptyIdentity,

    /// Descriptor without legacy match
    #[error("board {0}: empty legacy match")]
    EmptyLegacyMatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtflat_tree::{NodeSnapshot, TreeSnapshot};

    fn table() -> DescriptorTable {
        DescriptorTable::new(vec![
            BoardDescriptor::new("qcom,sdm845", "qcom,dwc3"),
            BoardDescriptor::new("lenovo,yoga-c630", "qcom,dwc3")
                .with_symbol("intc", "/soc@0/interrupt-controller@17a00000"),
            BoardDescriptor::new("qcom,apq8096", "qcom,dwc3"),
        ])
        .unwrap()
    }

    #[test]
    fn entries_are_sorted() {
        let table = table();
        let ids: Vec<_> = table.iter().map(BoardDescriptor::identity).collect();
        assert_eq!(ids, ["lenovo,yoga-c630", "qcom,apq8096", "qcom,sdm845"]);
    }

    #[test]
    fn lookup_is_exact() {
        let table = table();
        assert!(table.lookup("qcom,sdm845").is_some());
        assert!(table.lookup("qcom,sdm84").is_none());
        assert!(table.lookup("qcom,sdm845-mtp").is_none());
    }

    #[test]
    fn duplicates_rejected() {
        let err = DescriptorTable::new(vec![
            BoardDescriptor::new("qcom,sdm845", "qcom,dwc3"),
            BoardDescriptor::new("qcom,sdm845", "qcom,dwc3"),
        ])
        .unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateIdentity("qcom,sdm845".into()));
    }

    #[test]
    fn empty_keys_rejected() {
        assert_eq!(
            DescriptorTable::new(vec![BoardDescriptor::new("", "qcom,dwc3")]).unwrap_err(),
            DescriptorError::EmptyIdentity
        );
        assert!(matches!(
            DescriptorTable::new(vec![BoardDescriptor::new("x,y", "")]),
            Err(DescriptorError::EmptyLegacyMatch(_))
        ));
    }

    #[test]
    fn select_prefers_most_specific_tag() {
        let tree = TreeSnapshot::new(
            NodeSnapshot::new("").with_compatible(["lenovo,yoga-c630", "qcom,sdm845"]),
        )
        .build()
        .unwrap();
        let table = table();
        let board = table.select(&tree).unwrap();
        assert_eq!(board.identity(), "lenovo,yoga-c630");
        assert_eq!(board.symbols().len(), 1);
    }

    #[test]
    fn select_falls_through_to_soc() {
        let tree = TreeSnapshot::new(
            NodeSnapshot::new("").with_compatible(["qcom,sdm845-mtp", "qcom,sdm845"]),
        )
        .build()
        .unwrap();
        assert_eq!(table().select(&tree).unwrap().identity(), "qcom,sdm845");
    }

    #[test]
    fn unknown_board_selects_nothing() {
        let tree = TreeSnapshot::new(NodeSnapshot::new("").with_compatible(["unknown,board"]))
            .build()
            .unwrap();
        assert!(table().select(&tree).is_none());
    }

    #[test]
    fn blob_debug_hides_bytes() {
        let blob = OverlayBlob::from(vec![1, 2, 3]);
        assert_eq!(format!("{blob:?}"), "OverlayBlob(3 bytes)");
    }
}
