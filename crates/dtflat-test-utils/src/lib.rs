//! Testing utilities for the dtflat workspace
//!
//! Shared fixture trees, a board table matching them, and overlay appliers
//! that fail or record on demand.

#![allow(missing_docs)]

use dtflat_core::{
    glue_overlay, BoardDescriptor, DescriptorTable, FragmentOverlayApplier, OverlayApplier,
    OverlayBlob, OverlayError, OverlayFailure, OverlayHandle,
};
use dtflat_tree::{ConfigTree, NodeId, NodeSnapshot, PropValue, TreeSnapshot};

pub const BOARD: &str = "qcom,sdm845";
pub const USB_1: &str = "/soc@0/usb@a6f8800";
pub const USB_2: &str = "/soc@0/usb@a8f8800";

pub fn ports() -> NodeSnapshot {
    NodeSnapshot::new("ports")
        .with_property("#address-cells", 1u32)
        .with_property("#size-cells", 0u32)
        .with_child(
            NodeSnapshot::new("port@0")
                .with_property("reg", 0u32)
                .with_child(
                    NodeSnapshot::new("endpoint")
                        .with_property("remote-endpoint", PropValue::u32(0x42)),
                ),
        )
        .with_child(NodeSnapshot::new("port@1").with_property("reg", 1u32))
}

/// Legacy glue node with an `snps,dwc3` controller child
pub fn legacy_glue(name: &str, controller: NodeSnapshot) -> NodeSnapshot {
    NodeSnapshot::new(name)
        .with_compatible(["qcom,sdm845-dwc3", "qcom,dwc3"])
        .with_property("reg", PropValue::cells(&[0x0a6f_8800, 0x400]))
        .with_child(controller)
}

pub fn controller(name: &str) -> NodeSnapshot {
    NodeSnapshot::new(name)
        .with_compatible(["snps,dwc3"])
        .with_property("reg", PropValue::cells(&[0x0a60_0000, 0xcd00]))
        .with_flag("snps,dis_u2_susphy_quirk")
        .with_string("dr_mode", "otg")
        .with_flag("usb-role-switch")
        .with_string("maximum-speed", "super-speed")
        .with_flag("unrelated")
}

/// SDM845 board with two legacy glue nodes; the first has a `ports` subtree
pub fn legacy_snapshot() -> TreeSnapshot {
    TreeSnapshot::new(
        NodeSnapshot::new("")
            .with_compatible(["qcom,sdm845-mtp", BOARD])
            .with_child(
                NodeSnapshot::new("soc@0")
                    .with_child(NodeSnapshot::new("phy@88e2000"))
                    .with_child(legacy_glue(
                        "usb@a6f8800",
                        controller("usb@a600000").with_child(ports()),
                    ))
                    .with_child(legacy_glue("usb@a8f8800", controller("usb@a800000"))),
            ),
    )
}

pub fn legacy_tree() -> ConfigTree {
    build(&legacy_snapshot())
}

/// Same board with a board-supplied symbol table
pub fn legacy_tree_with_symbols() -> ConfigTree {
    let mut snapshot = legacy_snapshot();
    snapshot.root.children.push(
        NodeSnapshot::new("__symbols__").with_string("usb_1_hsphy", "/soc@0/phy@88e2000"),
    );
    build(&snapshot)
}

/// Tree whose root identity has no descriptor
pub fn unknown_board_tree() -> ConfigTree {
    let mut snapshot = legacy_snapshot();
    snapshot
        .root
        .properties
        .insert("compatible".to_string(), PropValue::string_list(["unknown,board"]));
    build(&snapshot)
}

pub fn build(snapshot: &TreeSnapshot) -> ConfigTree {
    snapshot.build().unwrap()
}

pub fn node(tree: &ConfigTree, path: &str) -> NodeId {
    tree.find_by_path(&path.parse().unwrap())
        .unwrap_or_else(|| panic!("no node at {path}"))
}

pub fn board_descriptor() -> BoardDescriptor {
    BoardDescriptor::new(BOARD, "qcom,dwc3")
        .with_symbol("intc", "/soc@0/interrupt-controller@17a00000")
        .with_symbol("usb_1_hsphy", "/soc@0/phy@88e2000")
        .with_overlay(glue_overlay(BOARD, &[USB_1, USB_2]))
}

pub fn test_table() -> DescriptorTable {
    DescriptorTable::new(vec![board_descriptor()]).unwrap()
}

pub fn table_with_overlay(overlay: OverlayBlob) -> DescriptorTable {
    DescriptorTable::new(vec![board_descriptor().with_overlay(overlay)]).unwrap()
}

/// How [`FailingOverlayApplier`] fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// Reject before touching the tree
    Immediately,
    /// Apply the overlay, then report failure with its handle
    AfterApplying,
}

/// Overlay applier that always fails `apply`
#[derive(Debug)]
pub struct FailingOverlayApplier {
    mode: FailMode,
    fail_remove: bool,
    inner: FragmentOverlayApplier,
    removed: Vec<OverlayHandle>,
}

impl FailingOverlayApplier {
    pub fn new(mode: FailMode) -> Self {
        Self {
            mode,
            fail_remove: false,
            inner: FragmentOverlayApplier::new(),
            removed: Vec::new(),
        }
    }

    /// Also fail every `remove`
    pub fn with_failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn removed(&self) -> &[OverlayHandle] {
        &self.removed
    }
}

impl OverlayApplier for FailingOverlayApplier {
    fn apply(
        &mut self,
        tree: &mut ConfigTree,
        blob: &OverlayBlob,
    ) -> Result<OverlayHandle, OverlayFailure> {
        let rejected = || OverlayError::Rejected("injected failure".to_string());
        match self.mode {
            FailMode::Immediately => Err(OverlayFailure::new(rejected())),
            FailMode::AfterApplying => {
                let handle = self.inner.apply(tree, blob)?;
                Err(OverlayFailure::partial(handle, rejected()))
            }
        }
    }

    fn remove(&mut self, tree: &mut ConfigTree, handle: OverlayHandle) -> Result<(), OverlayError> {
        if self.fail_remove {
            return Err(OverlayError::Rejected("injected removal failure".to_string()));
        }
        self.inner.remove(tree, handle)?;
        self.removed.push(handle);
        Ok(())
    }
}

/// Applier call log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayCall {
    Apply { bytes: usize, ok: bool },
    Remove(OverlayHandle),
}

/// Wraps an applier and records every call
#[derive(Debug, Default)]
pub struct RecordingOverlayApplier<A = FragmentOverlayApplier> {
    inner: A,
    calls: Vec<OverlayCall>,
}

impl<A: OverlayApplier> RecordingOverlayApplier<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[OverlayCall] {
        &self.calls
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: OverlayApplier> OverlayApplier for RecordingOverlayApplier<A> {
    fn apply(
        &mut self,
        tree: &mut ConfigTree,
        blob: &OverlayBlob,
    ) -> Result<OverlayHandle, OverlayFailure> {
        let result = self.inner.apply(tree, blob);
        self.calls.push(OverlayCall::Apply {
            bytes: blob.len(),
            ok: result.is_ok(),
        });
        result
    }

    fn remove(&mut self, tree: &mut ConfigTree, handle: OverlayHandle) -> Result<(), OverlayError> {
        self.calls.push(OverlayCall::Remove(handle));
        self.inner.remove(tree, handle)
    }
}
