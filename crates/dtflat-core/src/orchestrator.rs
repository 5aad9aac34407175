//! Migration orchestrator
//!
//! Runs the whole flattening pass against one tree:
//!
//! 1. select the board descriptor from the root `compatible` list
//! 2. stop if no legacy glue node is left
//! 3. commit the symbol table change set
//! 4. stage every legacy node into one migration change set and commit it
//! 5. apply the board overlay
//!
//! Each committed step is pushed onto an unwind stack. A failure pops and
//! reverts in reverse order, so the caller sees either the fully migrated
//! tree or the original one. The only exception is the symbol table after
//! an overlay failure, which stays unless
//! [`MigrationConfig::revert_symbols_on_overlay_failure`] is set. A commit
//! that cannot undo its own partial edits is reported as
//! [`MigrationError::Rollback`] and nothing further is reverted.

use crate::config::MigrationConfig;
use crate::descriptor::{BoardDescriptor, DescriptorTable};
use crate::error::{MigrationError, RollbackError, Stage};
use crate::migrator::{MigrationStep, SubtreeMigrator};
use crate::overlay::{OverlayApplier, OverlayFailure, OverlayHandle};
use crate::phase::{validate_transition, Phase, PhaseError};
use dtflat_symbol::{find_symbols_node, SymbolTableSynthesizer};
use dtflat_tree::{ChangeSet, CommitError, ConfigTree};
use serde::Serialize;

/// Label of the migration change set
pub const MIGRATION_CHANGESET: &str = "migration";

/// Check whether the tree no longer needs migrating
///
/// True when no attached node advertises `legacy_match`.
#[must_use]
pub fn already_migrated(tree: &ConfigTree, legacy_match: &str) -> bool {
    tree.find_compatible(legacy_match).is_empty()
}

/// Summary of a successful migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Identity of the selected descriptor
    pub board: String,
    /// Whether `/__symbols__` was created
    pub symbols_created: bool,
    /// Edits in the symbol change set
    pub symbol_edits: usize,
    /// Glue nodes that were flattened
    pub migrated: Vec<String>,
    /// Glue nodes without a controller child
    pub skipped: Vec<String>,
    /// Properties promoted across all glue nodes
    pub promoted_properties: usize,
    /// Nodes created by cloning `ports` subtrees
    pub cloned_nodes: usize,
    /// Edits in the migration change set
    pub migration_edits: usize,
    /// Applied overlay
    pub overlay: OverlayHandle,
    /// Tree digest before the run
    pub digest_before: String,
    /// Tree digest after the run
    pub digest_after: String,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum MigrationOutcome {
    /// Engine switched off
    Disabled,
    /// No descriptor for this board
    NoDescriptor,
    /// No legacy node left
    AlreadyApplied,
    /// Tree migrated
    Migrated(MigrationReport),
}

impl MigrationOutcome {
    /// Check if the tree was changed
    #[inline]
    #[must_use]
    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated(_))
    }

    /// Report, if the tree was migrated
    #[must_use]
    pub fn report(&self) -> Option<&MigrationReport> {
        match self {
            Self::Migrated(report) => Some(report),
            _ => None,
        }
    }
}

/// Read-only view of what a run would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeInspection {
    /// Root `compatible` tags
    pub root_compatible: Vec<String>,
    /// Selected descriptor, if any
    pub board: Option<String>,
    /// Legacy glue nodes present
    pub legacy_nodes: Vec<String>,
    /// Whether a symbol table exists
    pub has_symbols: bool,
}

impl TreeInspection {
    /// Check whether a run would migrate anything
    #[inline]
    #[must_use]
    pub fn needs_migration(&self) -> bool {
        self.board.is_some() && !self.legacy_nodes.is_empty()
    }
}

/// Committed work that can be undone
#[derive(Debug)]
enum Committed {
    Changes(ChangeSet),
    Overlay(OverlayHandle),
}

#[derive(Debug, Default)]
struct UnwindStack {
    entries: Vec<Committed>,
}

impl UnwindStack {
    fn push(&mut self, entry: Committed) {
        self.entries.push(entry);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Undo entries in reverse order until `keep` remain
    fn unwind_to<A: OverlayApplier + ?Sized>(
        &mut self,
        tree: &mut ConfigTree,
        applier: &mut A,
        keep: usize,
    ) -> Result<(), RollbackError> {
        while self.entries.len() > keep {
            match self.entries.pop() {
                Some(Committed::Changes(mut changeset)) => {
                    changeset.revert(tree)?;
                    tracing::debug!(changeset = changeset.label(), "reverted");
                }
                Some(Committed::Overlay(handle)) => {
                    applier.remove(tree, handle)?;
                    tracing::debug!(%handle, "overlay removed");
                }
                None => break,
            }
        }
        Ok(())
    }
}

/// Drives one migration run per call to [`run`](Self::run)
#[derive(Debug)]
pub struct MigrationOrchestrator<'t> {
    table: &'t DescriptorTable,
    config: MigrationConfig,
    phase: Phase,
}

impl<'t> MigrationOrchestrator<'t> {
    /// Create new orchestrator with default configuration
    #[inline]
    #[must_use]
    pub fn new(table: &'t DescriptorTable) -> Self {
        Self {
            table,
            config: MigrationConfig::default(),
            phase: Phase::Idle,
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: MigrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Phase reached by the last run
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Describe what a run would do, without touching the tree
    #[must_use]
    pub fn inspect(&self, tree: &ConfigTree) -> TreeInspection {
        let root_compatible = tree
            .node(tree.root())
            .map(|root| root.compatible().into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        let board = self.table.select(tree);
        let legacy_nodes = board
            .map(|b| {
                tree.find_compatible(b.legacy_match())
                    .into_iter()
                    .map(|id| tree.describe(id))
                    .collect()
            })
            .unwrap_or_default();
        TreeInspection {
            root_compatible,
            board: board.map(|b| b.identity().to_string()),
            legacy_nodes,
            has_symbols: find_symbols_node(tree).is_some(),
        }
    }

    /// Run the migration
    ///
    /// # Errors
    /// Returns the failure that aborted the run after unwinding committed
    /// work, or [`MigrationError::Rollback`] if unwinding itself failed.
    pub fn run<A: OverlayApplier + ?Sized>(
        &mut self,
        tree: &mut ConfigTree,
        applier: &mut A,
    ) -> Result<MigrationOutcome, MigrationError> {
        self.phase = Phase::Idle;

        if !self.config.enabled {
            tracing::info!("migration disabled, leaving tree untouched");
            self.advance(Phase::Done)?;
            return Ok(MigrationOutcome::Disabled);
        }

        let table = self.table;
        let Some(board) = table.select(tree) else {
            tracing::debug!("no board descriptor matches the root");
            self.advance(Phase::Done)?;
            return Ok(MigrationOutcome::NoDescriptor);
        };
        self.advance(Phase::Selected)?;

        if already_migrated(tree, board.legacy_match()) {
            tracing::debug!(board = board.identity(), "already applied");
            self.advance(Phase::Done)?;
            return Ok(MigrationOutcome::AlreadyApplied);
        }
        self.advance(Phase::Gated)?;

        let digest_before = tree.digest();
        tracing::info!(
            board = board.identity(),
            digest = %digest_before.short(),
            "flattening legacy nodes"
        );

        let mut stack = UnwindStack::default();
        match self.execute(tree, applier, board, &mut stack) {
            Ok(tally) => {
                self.advance(Phase::Done)?;
                let digest_after = tree.digest();
                tracing::info!(
                    board = board.identity(),
                    migrated = tally.migrated.len(),
                    skipped = tally.skipped.len(),
                    overlay = %tally.overlay,
                    digest = %digest_after.short(),
                    "migration complete"
                );
                Ok(MigrationOutcome::Migrated(MigrationReport {
                    board: board.identity().to_string(),
                    symbols_created: tally.symbol_edits > 0,
                    symbol_edits: tally.symbol_edits,
                    migrated: tally.migrated,
                    skipped: tally.skipped,
                    promoted_properties: tally.promoted_properties,
                    cloned_nodes: tally.cloned_nodes,
                    migration_edits: tally.migration_edits,
                    overlay: tally.overlay,
                    digest_before: digest_before.to_string(),
                    digest_after: digest_after.to_string(),
                }))
            }
            Err(Abort { cause, keep }) => Err(self.roll_back(tree, applier, &mut stack, keep, cause)),
        }
    }

    fn execute<A: OverlayApplier + ?Sized>(
        &mut self,
        tree: &mut ConfigTree,
        applier: &mut A,
        board: &BoardDescriptor,
        stack: &mut UnwindStack,
    ) -> Result<Tally, Abort> {
        // Symbols
        let mut symbols = SymbolTableSynthesizer::new()
            .with_limit(self.config.max_staged_edits)
            .ensure_symbols(tree, board.symbols())
            .map_err(|e| Abort::all(e.into()))?;
        let symbol_edits = symbols.len();
        symbols
            .commit(tree)
            .map_err(|source| Abort::commit(Stage::Symbols, source, stack.len()))?;
        stack.push(Committed::Changes(symbols));
        self.advance(Phase::SymbolsCommitted).map_err(Abort::phase)?;
        tracing::debug!(edits = symbol_edits, "symbols committed");

        // Migration
        let migrator = SubtreeMigrator::new(self.config.rules.clone());
        let mut changeset =
            ChangeSet::new(MIGRATION_CHANGESET).with_optional_limit(self.config.max_staged_edits);
        let mut migrated = Vec::new();
        let mut skipped = Vec::new();
        let mut promoted_properties = 0;
        let mut cloned_nodes = 0;

        for node in tree.find_compatible(board.legacy_match()) {
            match migrator.migrate(&mut changeset, tree, node) {
                Ok(MigrationStep::Skipped) => skipped.push(tree.describe(node)),
                Ok(MigrationStep::Migrated {
                    promoted,
                    cloned_nodes: cloned,
                    ..
                }) => {
                    migrated.push(tree.describe(node));
                    promoted_properties += promoted.len();
                    cloned_nodes += cloned;
                }
                Err(source) => {
                    tracing::error!(node = %tree.describe(node), error = %source, "failed to stage migration");
                    changeset.destroy();
                    return Err(Abort::all(MigrationError::Staging {
                        stage: Stage::Migration,
                        source,
                    }));
                }
            }
        }

        let migration_edits = changeset.len();
        if let Err(source) = changeset.commit(tree) {
            changeset.destroy();
            return Err(Abort::commit(Stage::Migration, source, stack.len()));
        }
        stack.push(Committed::Changes(changeset));
        self.advance(Phase::MigrationCommitted).map_err(Abort::phase)?;
        tracing::debug!(edits = migration_edits, "migration committed");

        // Overlay
        let symbols_kept = usize::from(!self.config.revert_symbols_on_overlay_failure);
        let overlay = match applier.apply(tree, board.overlay()) {
            Ok(handle) => handle,
            Err(OverlayFailure { handle, error }) => {
                if let Some(handle) = handle {
                    stack.push(Committed::Overlay(handle));
                }
                return Err(Abort {
                    cause: MigrationError::Overlay {
                        handle,
                        source: error,
                    },
                    keep: symbols_kept.min(stack.len()),
                });
            }
        };
        self.advance(Phase::OverlayApplied).map_err(Abort::phase)?;

        Ok(Tally {
            symbol_edits,
            migrated,
            skipped,
            promoted_properties,
            cloned_nodes,
            migration_edits,
            overlay,
        })
    }

    fn roll_back<A: OverlayApplier + ?Sized>(
        &mut self,
        tree: &mut ConfigTree,
        applier: &mut A,
        stack: &mut UnwindStack,
        keep: usize,
        cause: MigrationError,
    ) -> MigrationError {
        tracing::error!(phase = %self.phase, error = %cause, "migration failed, unwinding");
        if let Err(source) = stack.unwind_to(tree, applier, keep) {
            tracing::error!(error = %source, "rollback incomplete, tree may be inconsistent");
            self.phase = Phase::RolledBack;
            return MigrationError::Rollback {
                cause: Box::new(cause),
                source,
            };
        }
        if cause.is_rollback_failure() {
            tracing::error!(error = %cause, "partial commit could not be unwound, tree may be inconsistent");
        } else if keep > 0 {
            tracing::warn!("symbol table left in place after overlay failure");
        }
        match self.advance(Phase::RolledBack) {
            Ok(()) => cause,
            Err(err) => err.into(),
        }
    }

    fn advance(&mut self, to: Phase) -> Result<(), PhaseError> {
        validate_transition(self.phase, to)?;
        tracing::trace!(from = %self.phase, %to, "phase");
        self.phase = to;
        Ok(())
    }
}

/// Counts gathered by a successful run
#[derive(Debug)]
struct Tally {
    symbol_edits: usize,
    migrated: Vec<String>,
    skipped: Vec<String>,
    promoted_properties: usize,
    cloned_nodes: usize,
    migration_edits: usize,
    overlay: OverlayHandle,
}

/// Failure inside a run and how much committed work survives it
#[derive(Debug)]
struct Abort {
    cause: MigrationError,
    keep: usize,
}

impl Abort {
    fn all(cause: MigrationError) -> Self {
        Self { cause, keep: 0 }
    }

    /// Failed commit of `stage` with `committed` entries on the unwind stack
    ///
    /// A commit whose own unwind failed leaves the tree inconsistent; nothing
    /// else is reverted on top of it.
    fn commit(stage: Stage, source: CommitError, committed: usize) -> Self {
        match source {
            CommitError::Unwind { index, source, undo } => Self {
                cause: MigrationError::Rollback {
                    cause: Box::new(MigrationError::Commit {
                        stage,
                        source: CommitError::Edit { index, source },
                    }),
                    source: RollbackError::Unwind { stage, source: undo },
                },
                keep: committed,
            },
            source => Self::all(MigrationError::Commit { stage, source }),
        }
    }

    fn phase(err: PhaseError) -> Self {
        Self::all(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::glue_overlay;
    use crate::overlay::FragmentOverlayApplier;
    use dtflat_tree::{NodeSnapshot, TreeError, TreeSnapshot};

    fn table() -> DescriptorTable {
        DescriptorTable::new(vec![BoardDescriptor::new("qcom,sdm845", "qcom,dwc3")
            .with_symbol("usb_1", "/soc@0/usb@a6f8800")
            .with_overlay(glue_overlay("qcom,sdm845", &["/soc@0/usb@a6f8800"]))])
        .unwrap()
    }

    fn legacy() -> ConfigTree {
        TreeSnapshot::new(
            NodeSnapshot::new("")
                .with_compatible(["qcom,sdm845-mtp", "qcom,sdm845"])
                .with_child(
                    NodeSnapshot::new("soc@0").with_child(
                        NodeSnapshot::new("usb@a6f8800")
                            .with_compatible(["qcom,sdm845-dwc3", "qcom,dwc3"])
                            .with_child(
                                NodeSnapshot::new("usb@a600000")
                                    .with_compatible(["snps,dwc3"])
                                    .with_string("dr_mode", "host")
                                    .with_flag("snps,dis_u3_susphy_quirk"),
                            ),
                    ),
                ),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn full_run_then_idempotent() {
        let table = table();
        let mut tree = legacy();
        let mut applier = FragmentOverlayApplier::new();
        let mut orchestrator = MigrationOrchestrator::new(&table);

        let outcome = orchestrator.run(&mut tree, &mut applier).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.migrated, ["/soc@0/usb@a6f8800"]);
        assert!(report.symbols_created);
        assert_ne!(report.digest_before, report.digest_after);
        assert_eq!(orchestrator.phase(), Phase::Done);

        let after = tree.snapshot();
        let again = orchestrator.run(&mut tree, &mut applier).unwrap();
        assert_eq!(again, MigrationOutcome::AlreadyApplied);
        assert_eq!(tree.snapshot(), after);
    }

    #[test]
    fn inspection_reports_pending_work() {
        let table = table();
        let tree = legacy();
        let inspection = MigrationOrchestrator::new(&table).inspect(&tree);
        assert_eq!(inspection.board.as_deref(), Some("qcom,sdm845"));
        assert_eq!(inspection.legacy_nodes, ["/soc@0/usb@a6f8800"]);
        assert!(!inspection.has_symbols);
        assert!(inspection.needs_migration());
    }

    #[test]
    fn disabled_is_noop() {
        let table = table();
        let mut tree = legacy();
        let before = tree.snapshot();
        let mut orchestrator = MigrationOrchestrator::new(&table)
            .with_config(MigrationConfig::new().with_enabled(false));
        let outcome = orchestrator
            .run(&mut tree, &mut FragmentOverlayApplier::new())
            .unwrap();
        assert_eq!(outcome, MigrationOutcome::Disabled);
        assert_eq!(tree.snapshot(), before);
    }

    #[test]
    fn commit_unwind_failure_is_a_rollback_failure() {
        let abort = Abort::commit(
            Stage::Migration,
            CommitError::Unwind {
                index: 4,
                source: TreeError::DetachRoot,
                undo: TreeError::DetachRoot,
            },
            1,
        );
        assert_eq!(abort.keep, 1);
        assert!(abort.cause.is_rollback_failure());
        assert!(matches!(
            abort.cause.root_cause(),
            MigrationError::Commit {
                stage: Stage::Migration,
                source: CommitError::Edit { index: 4, .. },
            }
        ));
        assert!(matches!(
            abort.cause,
            MigrationError::Rollback {
                source: RollbackError::Unwind {
                    stage: Stage::Migration,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn clean_commit_failure_unwinds_everything() {
        let abort = Abort::commit(
            Stage::Symbols,
            CommitError::Edit {
                index: 0,
                source: TreeError::DetachRoot,
            },
            0,
        );
        assert_eq!(abort.keep, 0);
        assert!(matches!(
            abort.cause,
            MigrationError::Commit {
                stage: Stage::Symbols,
                ..
            }
        ));
    }

    #[test]
    fn report_carries_the_applied_handle() {
        let table = table();
        let mut applier = FragmentOverlayApplier::new();
        let mut orchestrator = MigrationOrchestrator::new(&table);

        let mut first = legacy();
        orchestrator.run(&mut first, &mut applier).unwrap();
        let mut second = legacy();
        let outcome = orchestrator.run(&mut second, &mut applier).unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.overlay, OverlayHandle::new(1));
        assert!(applier.is_applied(report.overlay));
        assert_eq!(report.digest_after, second.digest().to_string());
    }

    #[test]
    fn staging_failure_rolls_back_symbols() {
        let table = table();
        let mut tree = legacy();
        let before = tree.snapshot();
        // Two symbol edits fit; the migration set needs three.
        let mut orchestrator = MigrationOrchestrator::new(&table)
            .with_config(MigrationConfig::new().with_max_staged_edits(2));
        let err = orchestrator
            .run(&mut tree, &mut FragmentOverlayApplier::new())
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Staging {
                stage: Stage::Migration,
                ..
            }
        ));
        assert_eq!(orchestrator.phase(), Phase::RolledBack);
        assert_eq!(tree.snapshot(), before);
    }
}
