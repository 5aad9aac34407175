use dtflat_symbol::{SymbolEntry, SymbolTable, SymbolTableSynthesizer, SymbolValidator};
use dtflat_tree::{ChangeSetState, NodeSnapshot, TreeSnapshot};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn arb_symbols() -> impl Strategy<Value = Vec<SymbolEntry>> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,11}", "(/[a-z]{1,6}(@[0-9a-f]{1,8})?){1,4}", 0..12)
        .prop_map(|m: BTreeMap<String, String>| {
            m.into_iter().map(SymbolEntry::from).collect()
        })
}

proptest! {
    #[test]
    fn prop_table_reads_back_what_was_staged(symbols in arb_symbols()) {
        prop_assert!(SymbolValidator::new().validate(&symbols).is_ok());

        let mut tree = TreeSnapshot::new(NodeSnapshot::new("")).build().unwrap();
        let before = tree.snapshot();
        let mut cs = SymbolTableSynthesizer::new().ensure_symbols(&tree, &symbols).unwrap();
        prop_assert_eq!(cs.len(), symbols.len() + 1);
        cs.commit(&mut tree).unwrap();

        let table = SymbolTable::read(&tree).unwrap();
        prop_assert_eq!(table.entries(), &symbols[..]);

        cs.revert(&mut tree).unwrap();
        prop_assert_eq!(cs.state(), ChangeSetState::Reverted);
        prop_assert_eq!(tree.snapshot(), before);
    }
}

#[test]
fn existing_table_is_never_overwritten() {
    let snapshot = TreeSnapshot::new(
        NodeSnapshot::new("").with_child(
            NodeSnapshot::new("__symbols__").with_string("usb_1", "/soc@0/usb@a6f8800"),
        ),
    );
    let mut tree = snapshot.build().unwrap();

    let mut cs = SymbolTableSynthesizer::new()
        .ensure_symbols(&tree, &[SymbolEntry::new("usb_1", "/elsewhere")])
        .unwrap();
    cs.commit(&mut tree).unwrap();

    assert_eq!(tree.snapshot(), snapshot);
    let table = SymbolTable::read(&tree).unwrap();
    assert_eq!(table.get("usb_1"), Some("/soc@0/usb@a6f8800"));
}
