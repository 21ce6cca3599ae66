use crate::support::{chain, seeded_proof, MockEngine};
use athanor_core::kcfg::KEdge;
use athanor_core::term::Term;
use athanor_ops::{Error, Operation, SplitNode};

#[tokio::test]
async fn test_split_branches_on_condition_and_negation() {
    let mut proof = seeded_proof("test_split");
    let nodes = chain(&mut proof, &[1]);
    let tip = nodes[0];

    let engine = MockEngine::subsuming();
    let operation = SplitNode {
        node: tip,
        // chain() binds the marker variable VChain0 on the tip node.
        condition: "VChain0 <= 10".to_string(),
    };
    let outcome = operation.apply(&mut proof, &engine).await.expect("split");

    assert_eq!(outcome.created.len(), 2);
    let splits: Vec<_> = proof
        .kcfg
        .out_edges(tip)
        .into_iter()
        .filter(|(_, edge)| matches!(edge, KEdge::Split))
        .map(|(target, _)| target)
        .collect();
    assert_eq!(splits.len(), 2);
    assert!(!proof.is_pending(tip), "original is branched, not pending");
    assert_eq!(proof.pending(), outcome.created);

    let condition = Term::le_int(Term::var("VChain0"), Term::Int("10".to_string()));
    let first = proof.kcfg.node(outcome.created[0]).expect("node");
    let second = proof.kcfg.node(outcome.created[1]).expect("node");
    assert!(first.cterm.constraints().contains(&condition));
    assert!(second
        .cterm
        .constraints()
        .contains(&Term::not(condition)));
}

#[tokio::test]
async fn test_split_rejects_unknown_variable() {
    let mut proof = seeded_proof("test_split_unknown");
    let nodes = chain(&mut proof, &[1]);

    let engine = MockEngine::subsuming();
    let operation = SplitNode {
        node: nodes[0],
        condition: "VNotBound <= 10".to_string(),
    };
    let err = operation.apply(&mut proof, &engine).await.expect_err("must fail");
    assert!(matches!(err, Error::UnknownVariable(name) if name == "VNotBound"));
    assert!(proof.is_pending(nodes[0]), "failed split leaves the node pending");
}

#[tokio::test]
async fn test_split_requires_pending_node() {
    let mut proof = seeded_proof("test_split_pending");
    chain(&mut proof, &[1]);

    let engine = MockEngine::subsuming();
    let operation = SplitNode {
        node: proof.init,
        condition: "VInit <= 10".to_string(),
    };
    assert!(matches!(
        operation.apply(&mut proof, &engine).await,
        Err(Error::NotPending(_))
    ));
}

#[tokio::test]
async fn test_split_rejects_malformed_condition() {
    let mut proof = seeded_proof("test_split_parse");
    let nodes = chain(&mut proof, &[1]);

    let engine = MockEngine::subsuming();
    let operation = SplitNode {
        node: nodes[0],
        condition: "<= 10".to_string(),
    };
    assert!(matches!(
        operation.apply(&mut proof, &engine).await,
        Err(Error::Core(athanor_core::Error::PredicateParse { .. }))
    ));
}
