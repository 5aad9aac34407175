//! Orchestrator phase state machine

use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Progress of one orchestrator run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Not started
    Idle,
    /// Board descriptor found
    Selected,
    /// Legacy nodes found; migration will be attempted
    Gated,
    /// Symbol change set committed
    SymbolsCommitted,
    /// Migration change set committed
    MigrationCommitted,
    /// Overlay applied
    OverlayApplied,
    /// Finished; tree is in its final state
    Done,
    /// Failed; committed work has been unwound
    RolledBack,
}

impl Phase {
    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::RolledBack)
    }

    /// Short name for logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selected => "selected",
            Self::Gated => "gated",
            Self::SymbolsCommitted => "symbols-committed",
            Self::MigrationCommitted => "migration-committed",
            Self::OverlayApplied => "overlay-applied",
            Self::Done => "done",
            Self::RolledBack => "rolled-back",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phases reachable from `from`
///
/// Early exits (disabled, no descriptor, nothing to migrate) go straight
/// to `Done`; failures after the gate go to `RolledBack`.
#[must_use]
pub fn allowed_transitions(from: Phase) -> Vec<Phase> {
    use Phase::{Done, Gated, Idle, MigrationCommitted, OverlayApplied, RolledBack, Selected, SymbolsCommitted};
    match from {
        Idle => vec![Selected, Done],
        Selected => vec![Gated, Done],
        Gated => vec![SymbolsCommitted, RolledBack],
        SymbolsCommitted => vec![MigrationCommitted, RolledBack],
        MigrationCommitted => vec![OverlayApplied, RolledBack],
        OverlayApplied => vec![Done],
        Done | RolledBack => vec![],
    }
}

/// Validate a phase transition
///
/// # Errors
/// Returns [`PhaseError::IllegalTransition`] if `to` is not reachable
/// from `from`.
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), PhaseError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PhaseError::IllegalTransition { from, to })
    }
}

/// Phase machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    /// Transition not allowed
    #[error("illegal phase transition {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },
}
