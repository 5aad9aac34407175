use dtflat_tree::{
    ChangeSet, ChangeSetError, ChangeSetState, CommitError, ConfigTree, NodeRef, NodeSnapshot,
    PropValue, StagingError, TreeError, TreeSnapshot,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn board() -> ConfigTree {
    TreeSnapshot::new(
        NodeSnapshot::new("")
            .with_compatible(["qcom,sdm845"])
            .with_child(
                NodeSnapshot::new("soc@0")
                    .with_child(
                        NodeSnapshot::new("usb@a6f8800")
                            .with_compatible(["qcom,dwc3"])
                            .with_child(
                                NodeSnapshot::new("usb@a600000")
                                    .with_compatible(["snps,dwc3"])
                                    .with_string("dr_mode", "host"),
                            ),
                    )
                    .with_child(NodeSnapshot::new("phy@88e8000")),
            ),
    )
    .build()
    .unwrap()
}

fn at(tree: &ConfigTree, path: &str) -> dtflat_tree::NodeId {
    tree.find_by_path(&path.parse().unwrap()).unwrap()
}

#[test]
fn staging_does_not_touch_the_tree() {
    let tree = board();
    let before = tree.snapshot();
    let soc = at(&tree, "/soc@0");

    let mut cs = ChangeSet::new("staging");
    let n = cs.create_node(&tree, soc, "ports").unwrap();
    cs.add_property_string(&tree, n, "label", "x").unwrap();
    cs.detach_node(&tree, at(&tree, "/soc@0/phy@88e8000")).unwrap();

    assert_eq!(cs.len(), 3);
    assert_eq!(tree.snapshot(), before);
    assert_eq!(cs.destroy(), 3);
}

#[test]
fn commit_then_revert_restores_order() {
    let mut tree = board();
    let before = tree.snapshot();
    let usb = at(&tree, "/soc@0/usb@a6f8800");
    let dwc3 = at(&tree, "/soc@0/usb@a6f8800/usb@a600000");

    let mut cs = ChangeSet::new("round-trip");
    cs.add_property_string(&tree, usb, "dr_mode", "host").unwrap();
    let ports = cs.create_node(&tree, usb, "ports").unwrap();
    let port = cs.create_node(&tree, ports, "port@0").unwrap();
    cs.add_property(&tree, port, "reg", PropValue::u32(0)).unwrap();
    cs.update_property(&tree, at(&tree, "/"), "compatible", PropValue::string("x,y"))
        .unwrap();
    cs.detach_node(&tree, dwc3).unwrap();

    cs.commit(&mut tree).unwrap();
    assert_eq!(cs.state(), ChangeSetState::Committed);
    assert!(tree.find_by_path(&"/soc@0/usb@a6f8800/ports/port@0".parse().unwrap()).is_some());
    assert!(!tree.is_attached(dwc3));

    cs.revert(&mut tree).unwrap();
    assert_eq!(tree.snapshot(), before);
    assert!(tree.is_attached(dwc3));
}

#[test]
fn failed_commit_leaves_tree_unchanged() {
    let mut tree = board();
    let before = tree.snapshot();
    let usb = at(&tree, "/soc@0/usb@a6f8800");

    let mut cs = ChangeSet::new("conflict");
    cs.add_property_string(&tree, usb, "maximum-speed", "super-speed").unwrap();
    cs.create_node(&tree, usb, "ports").unwrap();
    // Second node with the same name fails at commit time.
    cs.create_node(&tree, usb, "ports").unwrap();

    let err = cs.commit(&mut tree).unwrap_err();
    assert!(matches!(
        err,
        CommitError::Edit {
            index: 2,
            source: TreeError::NameConflict { .. }
        }
    ));
    assert_eq!(tree.snapshot(), before);
    assert_eq!(cs.state(), ChangeSetState::Staging);
}

#[test]
fn double_detach_fails_atomically() {
    let mut tree = board();
    let before = tree.digest();
    let phy = at(&tree, "/soc@0/phy@88e8000");

    let mut cs = ChangeSet::new("double-detach");
    cs.detach_node(&tree, phy).unwrap();
    cs.detach_node(&tree, phy).unwrap();

    assert!(cs.commit(&mut tree).is_err());
    assert_eq!(tree.digest(), before);
}

#[test]
fn limit_models_exhaustion() {
    let tree = board();
    let mut cs = ChangeSet::new("limited").with_limit(1);
    cs.create_node(&tree, tree.root(), "a").unwrap();
    let err = cs.create_node(&tree, tree.root(), "b").unwrap_err();
    assert_eq!(err, StagingError::Exhausted { limit: 1 });
}

#[test]
fn staging_rejects_bad_targets() {
    let tree = board();
    let mut cs = ChangeSet::new("targets");
    assert!(matches!(
        cs.add_property(&tree, NodeRef::Staged(0), "x", PropValue::empty()),
        Err(StagingError::UnknownTarget(_))
    ));
    assert!(matches!(
        cs.detach_node(&tree, tree.root()),
        Err(StagingError::Tree(TreeError::DetachRoot))
    ));
    assert!(matches!(
        cs.create_node(&tree, tree.root(), "a/b"),
        Err(StagingError::Tree(TreeError::InvalidName(_)))
    ));
}

#[test]
fn lifecycle_is_enforced() {
    let mut tree = board();
    let mut cs = ChangeSet::new("lifecycle");
    assert_eq!(
        cs.revert(&mut tree),
        Err(ChangeSetError::InvalidState(ChangeSetState::Staging))
    );

    cs.commit(&mut tree).unwrap();
    assert_eq!(
        cs.commit(&mut tree),
        Err(CommitError::InvalidState(ChangeSetState::Committed))
    );
    assert!(matches!(
        cs.create_node(&tree, tree.root(), "late"),
        Err(StagingError::Closed(ChangeSetState::Committed))
    ));

    cs.revert(&mut tree).unwrap();
    assert_eq!(
        cs.revert(&mut tree),
        Err(ChangeSetError::InvalidState(ChangeSetState::Reverted))
    );
}

#[derive(Debug, Clone)]
struct Shape {
    props: Vec<u8>,
    children: Vec<Shape>,
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop::collection::vec(any::<u8>(), 0..3).prop_map(|props| Shape {
        props,
        children: Vec::new(),
    });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            prop::collection::vec(any::<u8>(), 0..3),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(props, children)| Shape { props, children })
    })
}

fn to_snapshot(name: String, shape: &Shape) -> NodeSnapshot {
    let mut node = NodeSnapshot::new(name);
    for (i, v) in shape.props.iter().enumerate() {
        node = node.with_property(format!("p{i}"), PropValue::u32(u32::from(*v)));
    }
    for (i, child) in shape.children.iter().enumerate() {
        node = node.with_child(to_snapshot(format!("c{i}"), child));
    }
    node
}

proptest! {
    #[test]
    fn prop_commit_revert_round_trip(
        shape in arb_shape(),
        ops in prop::collection::vec((0u8..4, any::<usize>()), 0..16),
    ) {
        let mut tree = TreeSnapshot::new(to_snapshot(String::new(), &shape)).build().unwrap();
        let before = tree.snapshot();
        let live: Vec<_> = tree.descendants(tree.root());
        let mut targets: Vec<NodeRef> = live.iter().map(|id| NodeRef::Live(*id)).collect();

        let mut cs = ChangeSet::new("prop");
        for (i, (kind, pick)) in ops.iter().enumerate() {
            let target = targets[pick % targets.len()];
            match kind {
                0 => {
                    if let Ok(created) = cs.create_node(&tree, target, &format!("new{i}")) {
                        targets.push(created);
                    }
                }
                1 => {
                    let _ = cs.add_property(&tree, target, &format!("x{i}"), PropValue::u32(i as u32));
                }
                2 => {
                    let _ = cs.update_property(&tree, target, "p0", PropValue::string("updated"));
                }
                _ => {
                    if live.len() > 1 {
                        let victim = live[1 + pick % (live.len() - 1)];
                        let _ = cs.detach_node(&tree, victim);
                    }
                }
            }
        }

        match cs.commit(&mut tree) {
            Ok(()) => {
                cs.revert(&mut tree).unwrap();
                prop_assert_eq!(tree.snapshot(), before);
            }
            Err(_) => prop_assert_eq!(tree.snapshot(), before),
        }
    }
}
