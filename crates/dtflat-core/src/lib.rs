//! dtflat Core
//!
//! Flattens legacy USB glue/controller node pairs in a hardware-description
//! tree, all or nothing.
//!
//! # Overview
//!
//! - [`DescriptorTable`]: Board identity → [`BoardDescriptor`]
//! - [`SubtreeMigrator`]: Stages the flattening of one glue node
//! - [`OverlayApplier`]: Applies/removes the board overlay
//! - [`MigrationOrchestrator`]: Symbols, migration and overlay with rollback
//!
//! # Example
//!
//! ```rust
//! use dtflat_core::{
//!     glue_overlay, BoardDescriptor, DescriptorTable, FragmentOverlayApplier,
//!     MigrationOrchestrator, MigrationOutcome,
//! };
//! use dtflat_tree::{NodeSnapshot, TreeSnapshot};
//!
//! let table = DescriptorTable::new(vec![BoardDescriptor::new("qcom,sdm845", "qcom,dwc3")
//!     .with_overlay(glue_overlay("qcom,sdm845", &["/usb@a6f8800"]))])
//! .unwrap();
//!
//! let mut tree = TreeSnapshot::new(
//!     NodeSnapshot::new("")
//!         .with_compatible(["qcom,sdm845"])
//!         .with_child(
//!             NodeSnapshot::new("usb@a6f8800")
//!                 .with_compatible(["qcom,dwc3"])
//!                 .with_child(NodeSnapshot::new("usb@a600000").with_compatible(["snps,dwc3"])),
//!         ),
//! )
//! .build()
//! .unwrap();
//!
//! let mut orchestrator = MigrationOrchestrator::new(&table);
//! let mut applier = FragmentOverlayApplier::new();
//! assert!(orchestrator.run(&mut tree, &mut applier).unwrap().is_migrated());
//! assert_eq!(
//!     orchestrator.run(&mut tree, &mut applier).unwrap(),
//!     MigrationOutcome::AlreadyApplied
//! );
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod builtin;
mod config;
mod descriptor;
mod error;
pub mod logging;
mod migrator;
mod orchestrator;
mod overlay;
mod phase;

// Re-exports
pub use builtin::{
    glue_overlay, legacy_glue_overlay, FLATTENED_GLUE_COMPATIBLE, LEGACY_GLUE_COMPATIBLE,
};
pub use config::{ConfigError, MigrationConfig};
pub use descriptor::{BoardDescriptor, DescriptorError, DescriptorTable, OverlayBlob};
pub use error::{MigrationError, RollbackError, Stage};
pub use migrator::{MigrationRules, MigrationStep, SubtreeMigrator};
pub use orchestrator::{
    already_migrated, MigrationOrchestrator, MigrationOutcome, MigrationReport, TreeInspection,
    MIGRATION_CHANGESET,
};
pub use overlay::{
    FragmentOverlayApplier, OverlayApplier, OverlayDocument, OverlayError, OverlayFailure,
    OverlayFragment, OverlayHandle, COMPATIBLE_TARGET_PREFIX,
};
pub use phase::{allowed_transitions, validate_transition, Phase, PhaseError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running a migration
    pub use crate::{
        BoardDescriptor, DescriptorTable, FragmentOverlayApplier, MigrationConfig, MigrationError,
        MigrationOrchestrator, MigrationOutcome, OverlayApplier,
    };
    pub use dtflat_tree::{ConfigTree, NodeSnapshot, TreeSnapshot};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use dtflat_tree::{NodeSnapshot, TreeSnapshot};

    #[test]
    fn builtin_board_round_trip() {
        let table = DescriptorTable::builtin().unwrap();
        let mut tree = TreeSnapshot::new(
            NodeSnapshot::new("")
                .with_compatible(["qcom,sc7180-idp", "qcom,sc7180"])
                .with_child(
                    NodeSnapshot::new("soc@0").with_child(
                        NodeSnapshot::new("usb@a6f8800")
                            .with_compatible(["qcom,sc7180-dwc3", LEGACY_GLUE_COMPATIBLE])
                            .with_child(
                                NodeSnapshot::new("usb@a600000")
                                    .with_compatible(["snps,dwc3"])
                                    .with_string("maximum-speed", "super-speed"),
                            ),
                    ),
                ),
        )
        .build()
        .unwrap();

        let mut applier = FragmentOverlayApplier::new();
        let outcome = MigrationOrchestrator::new(table)
            .run(&mut tree, &mut applier)
            .unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.board, "qcom,sc7180");
        assert_eq!(report.symbol_edits, 6);

        let usb = tree
            .find_by_path(&"/soc@0/usb@a6f8800".parse().unwrap())
            .unwrap();
        let glue = tree.node(usb).unwrap();
        assert!(glue.is_compatible(FLATTENED_GLUE_COMPATIBLE));
        assert!(glue.children().is_empty());
        assert!(already_migrated(&tree, LEGACY_GLUE_COMPATIBLE));
    }
}
