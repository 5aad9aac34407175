//! Failure injection at each step of a run
//!
//! After any failure the tree must match its pre-run state, except for the
//! symbol table when the overlay step fails and symbols are kept.

use dtflat_core::prelude::*;
use dtflat_core::{OverlayBlob, OverlayError, Phase, Stage};
use dtflat_symbol::ValidationError;
use dtflat_test_utils::{
    board_descriptor, legacy_glue, legacy_snapshot, legacy_tree, ports, table_with_overlay,
    test_table, FailMode, FailingOverlayApplier, OverlayCall, RecordingOverlayApplier, BOARD,
    USB_1,
};
use dtflat_tree::CommitError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Pre-run tree plus the board symbols
fn legacy_with_board_symbols() -> TreeSnapshot {
    let mut snapshot = legacy_snapshot();
    snapshot.root.children.push(
        NodeSnapshot::new("__symbols__")
            .with_string("intc", "/soc@0/interrupt-controller@17a00000")
            .with_string("usb_1_hsphy", "/soc@0/phy@88e2000"),
    );
    snapshot
}

fn migrated_snapshot() -> TreeSnapshot {
    let table = test_table();
    let mut tree = legacy_tree();
    MigrationOrchestrator::new(&table)
        .run(&mut tree, &mut FragmentOverlayApplier::new())
        .unwrap();
    tree.snapshot()
}

#[test]
fn test_symbol_staging_failure_leaves_tree_untouched() {
    let table = test_table();
    let mut tree = legacy_tree();
    let mut orchestrator = MigrationOrchestrator::new(&table)
        .with_config(MigrationConfig::new().with_max_staged_edits(2));

    let err = orchestrator
        .run(&mut tree, &mut FragmentOverlayApplier::new())
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Staging {
            stage: Stage::Symbols,
            ..
        }
    ));
    assert_eq!(orchestrator.phase(), Phase::RolledBack);
    assert_eq!(tree.snapshot(), legacy_snapshot());
}

#[test]
fn test_invalid_symbol_list_is_rejected() {
    let table = DescriptorTable::new(vec![board_descriptor().with_symbol("intc", "/soc@0")]).unwrap();
    let mut tree = legacy_tree();

    let err = MigrationOrchestrator::new(&table)
        .run(&mut tree, &mut FragmentOverlayApplier::new())
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::InvalidSymbols(ValidationError::DuplicateLabel { .. })
    ));
    assert_eq!(tree.snapshot(), legacy_snapshot());
}

#[test]
fn test_migration_staging_failure_reverts_symbols() {
    let table = test_table();
    let mut tree = legacy_tree();
    let mut applier = RecordingOverlayApplier::new(FragmentOverlayApplier::new());
    let mut orchestrator = MigrationOrchestrator::new(&table)
        .with_config(MigrationConfig::new().with_max_staged_edits(10));

    let err = orchestrator.run(&mut tree, &mut applier).unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Staging {
            stage: Stage::Migration,
            ..
        }
    ));
    assert_eq!(tree.snapshot(), legacy_snapshot());
    assert!(applier.calls().is_empty());
}

#[test]
fn test_commit_conflict_reverts_symbols() {
    // The second glue node already carries `dr_mode`, so promoting the
    // controller's copy fails at commit time.
    let mut snapshot = legacy_snapshot();
    let soc = &mut snapshot.root.children[0];
    soc.children[2] = legacy_glue("usb@a8f8800", dtflat_test_utils::controller("usb@a800000"))
        .with_string("dr_mode", "host");
    let mut tree = snapshot.build().unwrap();
    let table = test_table();
    let mut orchestrator = MigrationOrchestrator::new(&table);

    let err = orchestrator
        .run(&mut tree, &mut FragmentOverlayApplier::new())
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Commit {
            stage: Stage::Migration,
            source: CommitError::Edit { .. },
        }
    ));
    assert_eq!(orchestrator.phase(), Phase::RolledBack);
    assert_eq!(tree.snapshot(), snapshot);
}

#[test]
fn test_overlay_rejection_keeps_symbols() {
    let table = test_table();
    let mut tree = legacy_tree();
    let mut applier = FailingOverlayApplier::new(FailMode::Immediately);

    let err = MigrationOrchestrator::new(&table)
        .run(&mut tree, &mut applier)
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Overlay {
            handle: None,
            source: OverlayError::Rejected(_),
        }
    ));
    assert!(applier.removed().is_empty());
    assert_eq!(tree.snapshot(), legacy_with_board_symbols());
}

#[test]
fn test_partial_overlay_is_removed() {
    let table = test_table();
    let mut tree = legacy_tree();
    let mut applier = FailingOverlayApplier::new(FailMode::AfterApplying);

    let err = MigrationOrchestrator::new(&table)
        .run(&mut tree, &mut applier)
        .unwrap_err();

    let MigrationError::Overlay {
        handle: Some(handle),
        ..
    } = err
    else {
        panic!("expected overlay failure with handle, got {err}");
    };
    assert_eq!(applier.removed(), [handle]);
    assert_eq!(tree.snapshot(), legacy_with_board_symbols());
}

#[test]
fn test_overlay_failure_can_revert_symbols() {
    let table = test_table();
    let mut tree = legacy_tree();
    let mut orchestrator = MigrationOrchestrator::new(&table)
        .with_config(MigrationConfig::new().with_revert_symbols_on_overlay_failure(true));

    orchestrator
        .run(&mut tree, &mut FailingOverlayApplier::new(FailMode::AfterApplying))
        .unwrap_err();

    assert_eq!(orchestrator.phase(), Phase::RolledBack);
    assert_eq!(tree.snapshot(), legacy_snapshot());
}

#[test]
fn test_failing_fragment_unwinds_earlier_fragments() {
    let overlay = serde_json::json!({
        "fragments": [
            { "target": USB_1, "node": { "properties": { "status": "okay" } } },
            { "target": "/soc@0/missing", "node": { "properties": { "status": "okay" } } },
        ]
    });
    let table = table_with_overlay(OverlayBlob::from(overlay.to_string()));
    let mut tree = legacy_tree();
    let mut applier = RecordingOverlayApplier::new(FragmentOverlayApplier::new());

    let err = MigrationOrchestrator::new(&table)
        .run(&mut tree, &mut applier)
        .unwrap_err();

    let MigrationError::Overlay {
        handle: Some(handle),
        source: OverlayError::UnresolvedTarget(target),
    } = err
    else {
        panic!("expected unresolved overlay target, got {err}");
    };
    assert_eq!(target, "/soc@0/missing");
    assert_eq!(applier.calls()[1], OverlayCall::Remove(handle));
    assert_eq!(applier.inner().applied(), 0);
    assert_eq!(tree.snapshot(), legacy_with_board_symbols());
}

#[test]
fn test_undecodable_overlay_fails_without_handle() {
    let table = table_with_overlay(OverlayBlob::from(b"\x00not json".as_slice()));
    let mut tree = legacy_tree();

    let err = MigrationOrchestrator::new(&table)
        .run(&mut tree, &mut FragmentOverlayApplier::new())
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Overlay {
            handle: None,
            source: OverlayError::Decode(_),
        }
    ));
    assert_eq!(tree.snapshot(), legacy_with_board_symbols());
}

#[test]
fn test_retry_after_overlay_failure_reuses_symbols() {
    let table = test_table();
    let mut tree = legacy_tree();
    let mut orchestrator = MigrationOrchestrator::new(&table);

    orchestrator
        .run(&mut tree, &mut FailingOverlayApplier::new(FailMode::Immediately))
        .unwrap_err();
    let outcome = orchestrator
        .run(&mut tree, &mut FragmentOverlayApplier::new())
        .unwrap();

    let report = outcome.report().unwrap();
    assert!(!report.symbols_created);
    assert_eq!(tree.snapshot(), migrated_snapshot());
}

#[test]
fn test_failed_removal_is_reported() {
    let table = test_table();
    let mut tree = legacy_tree();
    let mut applier = FailingOverlayApplier::new(FailMode::AfterApplying).with_failing_remove();
    let mut orchestrator = MigrationOrchestrator::new(&table);

    let err = orchestrator.run(&mut tree, &mut applier).unwrap_err();

    assert!(err.is_rollback_failure());
    assert!(matches!(err.root_cause(), MigrationError::Overlay { .. }));
    assert_eq!(orchestrator.phase(), Phase::RolledBack);
    assert_ne!(tree.snapshot(), legacy_snapshot());
}

#[test]
fn test_ports_only_controller_fixture() {
    // Cloning still works when the controller has nothing to promote.
    let usb = NodeSnapshot::new("usb@a600000")
        .with_compatible(["snps,dwc3"])
        .with_child(ports());
    let mut tree = TreeSnapshot::new(
        NodeSnapshot::new("")
            .with_compatible([BOARD])
            .with_child(NodeSnapshot::new("soc@0").with_child(legacy_glue("usb@a6f8800", usb))),
    )
    .build()
    .unwrap();
    let table = table_with_overlay(dtflat_core::glue_overlay(BOARD, &[USB_1]));

    let outcome = MigrationOrchestrator::new(&table)
        .run(&mut tree, &mut FragmentOverlayApplier::new())
        .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.promoted_properties, 0);
    assert_eq!(report.cloned_nodes, 4);
    let glue = tree.snapshot().root.children[0].children[0].clone();
    assert_eq!(glue.children, [ports()]);
}

proptest! {
    #[test]
    fn prop_run_is_all_or_nothing(limit in 0usize..32) {
        let table = test_table();
        let mut tree = legacy_tree();
        let result = MigrationOrchestrator::new(&table)
            .with_config(MigrationConfig::new().with_max_staged_edits(limit))
            .run(&mut tree, &mut FragmentOverlayApplier::new());

        match result {
            Ok(outcome) => {
                prop_assert!(outcome.is_migrated());
                prop_assert_eq!(tree.snapshot(), migrated_snapshot());
            }
            Err(err) => {
                prop_assert!(!err.is_rollback_failure());
                prop_assert_eq!(tree.snapshot(), legacy_snapshot());
            }
        }
    }
}
