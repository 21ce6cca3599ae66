use crate::support::{chain, seeded_proof, MockEngine};
use athanor_core::term::Term;
use athanor_ops::{Error, Operation, RefuteNode, UnrefuteNode};

#[tokio::test]
async fn test_refute_builds_negated_claim_subproof() {
    let mut proof = seeded_proof("test_refute");
    let nodes = chain(&mut proof, &[1]);
    let tip = nodes[0];
    let last_constraint = proof
        .kcfg
        .node(tip)
        .expect("node")
        .cterm
        .constraints()
        .last()
        .expect("tip carries a constraint")
        .clone();

    let engine = MockEngine::subsuming();
    let outcome = RefuteNode { node: tip }
        .apply(&mut proof, &engine)
        .await
        .expect("refute");

    let (subproof_id, subproof) = outcome.subproof.expect("detached subproof");
    assert_eq!(proof.refutations.get(&tip), Some(&subproof_id));
    assert!(proof.subproofs.contains(&subproof_id));
    assert!(!proof.is_pending(tip));

    // The subproof's target carries the negation of the refuted branch
    // condition.
    let target = subproof.kcfg.node(subproof.target).expect("target");
    assert!(target
        .cterm
        .constraints()
        .contains(&Term::not(last_constraint)));
}

#[tokio::test]
async fn test_unrefute_restores_pending_and_drops_subproof() {
    let mut proof = seeded_proof("test_unrefute");
    let nodes = chain(&mut proof, &[1]);
    let tip = nodes[0];

    let engine = MockEngine::subsuming();
    RefuteNode { node: tip }
        .apply(&mut proof, &engine)
        .await
        .expect("refute");
    let outcome = UnrefuteNode { node: tip }
        .apply(&mut proof, &engine)
        .await
        .expect("unrefute");

    assert!(outcome.subproof.is_none());
    assert!(proof.is_pending(tip));
    assert!(proof.refutations.is_empty());
    assert!(proof.subproofs.is_empty());
}

#[tokio::test]
async fn test_refute_requires_pending_and_constraints() {
    let mut proof = seeded_proof("test_refute_errors");
    let nodes = chain(&mut proof, &[1]);

    let engine = MockEngine::subsuming();
    assert!(matches!(
        RefuteNode { node: proof.init }.apply(&mut proof, &engine).await,
        Err(Error::NotPending(_))
    ));

    // Strip the tip's constraints: nothing left to refute.
    let mut bare = proof.kcfg.node(nodes[0]).expect("node").cterm.clone();
    bare.set_constraints(Vec::new());
    proof.kcfg.let_node(nodes[0], bare).expect("let");
    assert!(matches!(
        RefuteNode { node: nodes[0] }.apply(&mut proof, &engine).await,
        Err(Error::NothingToRefute(_))
    ));

    assert!(matches!(
        UnrefuteNode { node: nodes[0] }.apply(&mut proof, &engine).await,
        Err(Error::Core(athanor_core::Error::NotRefuted(_)))
    ));
}
