use crate::support::{cterm_at, seeded_proof, MockEngine};
use athanor_core::term::Term;
use athanor_ops::{Error, MergeNodes, Operation};

#[tokio::test]
async fn test_merge_requires_structural_equality() {
    let mut proof = seeded_proof("test_merge_structural");
    // Same program, different program counters: executing different code.
    let a = proof.kcfg.create_node(cterm_at(4, "VA"));
    let b = proof.kcfg.create_node(cterm_at(8, "VB"));
    proof.kcfg.create_edge(proof.init, a, 1).expect("edge");
    proof.kcfg.create_edge(proof.init, b, 1).expect("edge");

    let engine = MockEngine::subsuming();
    let operation = MergeNodes {
        nodes: vec![a, b],
        include_disjunct: false,
    };
    let err = operation.apply(&mut proof, &engine).await.expect_err("must fail");
    let Error::StructuralMismatch { cells } = err else {
        panic!("expected structural mismatch, got {err}");
    };
    assert_eq!(cells, vec!["pc".to_string()]);
    // Validation must reject before mutating anything.
    assert_eq!(proof.kcfg.node_count(), 4);
}

#[tokio::test]
async fn test_merge_generalizes_and_covers_each_original() {
    let mut proof = seeded_proof("test_merge_ok");
    // Identical structural cells, different variable instantiations.
    let a = proof.kcfg.create_node(cterm_at(4, "VLeft"));
    let b = proof.kcfg.create_node(cterm_at(4, "VRight"));
    let c = proof.kcfg.create_node(cterm_at(4, "VThird"));
    proof.kcfg.create_edge(proof.init, a, 1).expect("edge");
    proof.kcfg.create_edge(proof.init, b, 1).expect("edge");
    proof.kcfg.create_edge(proof.init, c, 1).expect("edge");
    let before = proof.kcfg.node_count();

    let engine = MockEngine::subsuming();
    let operation = MergeNodes {
        nodes: vec![a, b, c],
        include_disjunct: false,
    };
    let outcome = operation.apply(&mut proof, &engine).await.expect("merge");

    assert_eq!(outcome.created.len(), 1, "exactly one generalized node");
    let merged = outcome.created[0];
    assert_eq!(proof.kcfg.node_count(), before + 1);
    assert_eq!(
        proof.kcfg.covers_into(merged),
        vec![a, b, c],
        "one cover per original"
    );
    assert_eq!(proof.pending(), vec![merged], "only the merged node is frontier");

    // The differing cell generalized to a fresh variable.
    let generalized = proof.kcfg.node(merged).expect("node");
    assert!(matches!(generalized.cterm.cell("value"), Some(Term::Var(_))));
    assert_eq!(generalized.cterm.cell("pc"), Some(&Term::int(4u8)));
}

#[tokio::test]
async fn test_merge_disjunct_keeps_original_constraints() {
    let mut proof = seeded_proof("test_merge_disjunct");
    let a = proof.kcfg.create_node(cterm_at(4, "VLeft"));
    let b = proof.kcfg.create_node(cterm_at(4, "VRight"));
    proof.kcfg.create_edge(proof.init, a, 1).expect("edge");
    proof.kcfg.create_edge(proof.init, b, 1).expect("edge");

    let engine = MockEngine::subsuming();
    let with_disjunct = MergeNodes {
        nodes: vec![a, b],
        include_disjunct: true,
    };
    let outcome = with_disjunct.apply(&mut proof, &engine).await.expect("merge");
    let merged = proof.kcfg.node(outcome.created[0]).expect("node");
    assert_eq!(merged.cterm.constraints().len(), 1);
    assert!(matches!(
        &merged.cterm.constraints()[0],
        Term::App(label, _) if label == "orBool"
    ));
}

#[tokio::test]
async fn test_merge_needs_two_nodes() {
    let mut proof = seeded_proof("test_merge_arity");
    let a = proof.kcfg.create_node(cterm_at(4, "VA"));
    proof.kcfg.create_edge(proof.init, a, 1).expect("edge");

    let engine = MockEngine::subsuming();
    let operation = MergeNodes {
        nodes: vec![a],
        include_disjunct: false,
    };
    assert!(matches!(
        operation.apply(&mut proof, &engine).await,
        Err(Error::TooFewNodes { needed: 2, got: 1 })
    ));
}

#[tokio::test]
async fn test_merge_rejects_non_leaf() {
    let mut proof = seeded_proof("test_merge_leaf");
    let a = proof.kcfg.create_node(cterm_at(4, "VA"));
    let b = proof.kcfg.create_node(cterm_at(4, "VB"));
    proof.kcfg.create_edge(proof.init, a, 1).expect("edge");
    proof.kcfg.create_edge(a, b, 1).expect("edge");

    let engine = MockEngine::subsuming();
    let operation = MergeNodes {
        nodes: vec![a, b],
        include_disjunct: false,
    };
    assert!(matches!(
        operation.apply(&mut proof, &engine).await,
        Err(Error::Core(athanor_core::Error::AlreadyTerminal(_)))
    ));
    // Nothing was covered.
    assert!(proof.kcfg.covers_into(b).is_empty());
}
