use crate::support::cterm_at;
use athanor_core::kcfg::{KEdge, Kcfg};
use athanor_core::Error;
use std::collections::BTreeSet;

#[test]
fn test_node_ids_are_monotone_and_stable() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    assert!(a < b);

    let keep = BTreeSet::new();
    kcfg.prune(b, &keep).expect("prune");
    let c = kcfg.create_node(cterm_at(2, "VC"));
    assert!(c > b, "ids must never be reused after removal");
}

#[test]
fn test_edge_depth_must_be_positive() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    assert!(matches!(
        kcfg.create_edge(a, b, 0),
        Err(Error::InvalidDepth(0))
    ));
    kcfg.create_edge(a, b, 3).expect("edge");
    assert_eq!(kcfg.edge_depth(a, b), Some(3));
}

#[test]
fn test_cover_is_exclusive_disposition() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    let c = kcfg.create_node(cterm_at(2, "VC"));

    kcfg.create_cover(a, b).expect("cover");
    assert!(kcfg.is_covered(a));
    assert!(matches!(
        kcfg.create_cover(a, c),
        Err(Error::AlreadyTerminal(node)) if node == a
    ));
    assert!(matches!(
        kcfg.create_edge(a, c, 1),
        Err(Error::AlreadyTerminal(node)) if node == a
    ));

    // Branching is legal: several step edges from one node.
    kcfg.create_edge(b, a, 1).expect("first branch");
    kcfg.create_edge(b, c, 1).expect("second branch");
    assert!(matches!(
        kcfg.create_cover(b, c),
        Err(Error::AlreadyTerminal(node)) if node == b
    ));
}

#[test]
fn test_let_node_preserves_identity_and_edges() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    kcfg.create_edge(a, b, 2).expect("edge");

    kcfg.let_node(a, cterm_at(9, "VReplaced")).expect("let");
    assert_eq!(kcfg.node(a).expect("node").id, a);
    assert_eq!(kcfg.edge_depth(a, b), Some(2));
    assert_eq!(
        kcfg.node(a).expect("node").cterm.cell("pc"),
        cterm_at(9, "VReplaced").cell("pc")
    );
}

#[test]
fn test_prune_is_transitively_complete() {
    // init -> a -> b -> c, and init -> d -> c: pruning a removes a and b,
    // but c survives through d.
    let mut kcfg = Kcfg::new();
    let init = kcfg.create_node(cterm_at(0, "VInit"));
    let a = kcfg.create_node(cterm_at(1, "VA"));
    let b = kcfg.create_node(cterm_at(2, "VB"));
    let c = kcfg.create_node(cterm_at(3, "VC"));
    let d = kcfg.create_node(cterm_at(4, "VD"));
    kcfg.create_edge(init, a, 1).expect("edge");
    kcfg.create_edge(a, b, 1).expect("edge");
    kcfg.create_edge(b, c, 1).expect("edge");
    kcfg.create_edge(init, d, 1).expect("edge");
    kcfg.create_edge(d, c, 1).expect("edge");

    let keep = BTreeSet::new();
    let removed = kcfg.prune(a, &keep).expect("prune");
    assert_eq!(removed, vec![a, b]);
    assert!(kcfg.contains(c), "alternate path must keep c alive");
    assert!(kcfg.contains(d));
    assert_eq!(kcfg.node_count(), 3);
}

#[test]
fn test_prune_keeps_protected_nodes() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    let target = kcfg.create_node(cterm_at(2, "VTarget"));
    kcfg.create_edge(a, b, 1).expect("edge");
    kcfg.create_cover(b, target).expect("cover");

    let keep = BTreeSet::from([target]);
    let removed = kcfg.prune(a, &keep).expect("prune");
    assert_eq!(removed, vec![a, b]);
    assert!(kcfg.contains(target));
}

#[test]
fn test_minimize_collapses_interior_chain() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    let c = kcfg.create_node(cterm_at(2, "VC"));
    kcfg.create_edge(a, b, 4).expect("edge");
    kcfg.create_edge(b, c, 6).expect("edge");

    let protected = BTreeSet::from([a, c]);
    let removed = kcfg.minimize(&protected);
    assert_eq!(removed, vec![b]);
    assert_eq!(kcfg.edge_depth(a, c), Some(10), "depths must sum");
    assert_eq!(kcfg.node_count(), 2);
}

#[test]
fn test_minimize_respects_protection_and_branching() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    let c = kcfg.create_node(cterm_at(2, "VC"));
    let d = kcfg.create_node(cterm_at(3, "VD"));
    kcfg.create_edge(a, b, 1).expect("edge");
    kcfg.create_edge(b, c, 1).expect("edge");
    kcfg.create_edge(b, d, 1).expect("edge");

    // b branches, so nothing is collapsible even when unprotected.
    let protected = BTreeSet::from([a]);
    assert!(kcfg.minimize(&protected).is_empty());
    assert_eq!(kcfg.node_count(), 4);
}

#[test]
fn test_data_round_trip_preserves_identity() {
    let mut kcfg = Kcfg::new();
    let a = kcfg.create_node(cterm_at(0, "VA"));
    let b = kcfg.create_node(cterm_at(1, "VB"));
    let c = kcfg.create_node(cterm_at(2, "VC"));
    kcfg.create_edge(a, b, 5).expect("edge");
    kcfg.create_cover(b, c).expect("cover");
    kcfg.create_split(c, &[a]).expect("split");

    let data = kcfg.to_data();
    let text = serde_json::to_string(&data).expect("serialize");
    let back = Kcfg::from_data(serde_json::from_str(&text).expect("deserialize")).expect("rebuild");

    assert_eq!(back.node_count(), 3);
    assert_eq!(back.edge_depth(a, b), Some(5));
    assert!(back.is_covered(b));
    assert!(back
        .out_edges(c)
        .iter()
        .any(|(target, edge)| *target == a && matches!(edge, KEdge::Split)));

    let mut rebuilt = back;
    let d = rebuilt.create_node(cterm_at(3, "VD"));
    assert!(d > c, "restored counter must stay ahead of stored ids");
}
