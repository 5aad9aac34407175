//! Validation for symbol lists
//!
//! Checks a board's symbol list before it is staged: every label must be a
//! valid property name, appear once, and point at an absolute path.

use crate::symbol::SymbolEntry;
use dtflat_tree::validate_property_name;
use std::collections::HashSet;

/// Symbol list validation
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolValidator;

impl SymbolValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a symbol list
    ///
    /// # Returns
    /// - `Ok(())` if every entry is well formed and labels are unique
    /// - `Err(ValidationError)` for the first offending entry
    pub fn validate(&self, symbols: &[SymbolEntry]) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(symbols.len());
        for (index, entry) in symbols.iter().enumerate() {
            Self::validate_entry(index, entry)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(ValidationError::DuplicateLabel {
                    index,
                    name: entry.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_entry(index: usize, entry: &SymbolEntry) -> Result<(), ValidationError> {
        if validate_property_name(&entry.name).is_err() {
            return Err(ValidationError::InvalidLabel {
                index,
                name: entry.name.clone(),
            });
        }
        if entry.node_path().is_err() {
            return Err(ValidationError::InvalidPath {
                index,
                name: entry.name.clone(),
                path: entry.path.clone(),
            });
        }
        Ok(())
    }
}

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Label is empty or contains reserved characters
    #[error("symbol #{index}: invalid label {name:?}")]
    InvalidLabel { index: usize, name: String },

    /// Path is not absolute or has empty segments
    #[error("symbol #{index} ({name}): invalid path {path:?}")]
    InvalidPath {
        index: usize,
        name: String,
        path: String,
    },

    /// Label appears more than once
    #[error("symbol #{index}: duplicate label {name}")]
    DuplicateLabel { index: usize, name: String },
}
