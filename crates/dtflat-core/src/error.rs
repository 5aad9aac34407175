//! Error types for the migration engine
//!
//! "No descriptor", "already applied" and "disabled" are outcomes, not
//! errors; see [`MigrationOutcome`](crate::MigrationOutcome). Everything
//! here means the run failed and the tree was unwound, except
//! [`MigrationError::Rollback`], where unwinding itself failed.

use crate::overlay::{OverlayError, OverlayHandle};
use crate::phase::PhaseError;
use dtflat_symbol::{SymbolError, ValidationError};
use dtflat_tree::{ChangeSetError, CommitError, StagingError, TreeError};
use std::fmt::{self, Display, Formatter};

/// Change set a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Symbol table change set
    Symbols,
    /// Subtree migration change set
    Migration,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Symbols => "symbols",
            Self::Migration => "migration",
        })
    }
}

/// Main migration error type
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Edit could not be staged
    #[error("{stage}: failed to stage edits: {source}")]
    Staging {
        stage: Stage,
        #[source]
        source: StagingError,
    },

    /// Board symbol list is malformed
    #[error("symbols: invalid symbol list: {0}")]
    InvalidSymbols(#[source] ValidationError),

    /// Change set could not be committed
    #[error("{stage}: commit failed: {source}")]
    Commit {
        stage: Stage,
        #[source]
        source: CommitError,
    },

    /// Overlay application failed
    #[error("overlay failed: {source}")]
    Overlay {
        /// Handle of the partial overlay that was removed, if any
        handle: Option<OverlayHandle>,
        #[source]
        source: OverlayError,
    },

    /// Unwinding after a failure did not complete; the tree may be
    /// partially migrated
    #[error("rollback failed after `{cause}`: {source}")]
    Rollback {
        /// Failure that triggered the unwind
        cause: Box<MigrationError>,
        #[source]
        source: RollbackError,
    },

    /// Internal phase sequencing bug
    #[error("internal error: {0}")]
    Phase(#[from] PhaseError),
}

impl MigrationError {
    /// Check whether the tree may be left inconsistent
    #[inline]
    #[must_use]
    pub fn is_rollback_failure(&self) -> bool {
        matches!(self, Self::Rollback { .. })
    }

    /// The failure that started the unwind
    #[must_use]
    pub fn root_cause(&self) -> &MigrationError {
        match self {
            Self::Rollback { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

impl From<SymbolError> for MigrationError {
    fn from(err: SymbolError) -> Self {
        match err {
            SymbolError::Invalid(e) => Self::InvalidSymbols(e),
            SymbolError::Staging(source) => Self::Staging {
                stage: Stage::Symbols,
                source,
            },
        }
    }
}

/// Errors while undoing committed work
#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    /// Change set revert failed
    #[error("change set revert failed: {0}")]
    ChangeSet(#[from] ChangeSetError),

    /// Overlay removal failed
    #[error("overlay removal failed: {0}")]
    Overlay(#[from] OverlayError),

    /// Partially committed change set could not be undone
    #[error("{stage}: partial commit could not be undone: {source}")]
    Unwind {
        stage: Stage,
        #[source]
        source: TreeError,
    },
}
