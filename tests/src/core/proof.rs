use crate::support::{chain, seeded_proof};
use athanor_core::{Error, Proof, ProofId, ProofStatus};

#[test]
fn test_proof_id_parse_and_display() {
    let id = ProofId::parse("Token.test_transfer(uint256,address):3").expect("parse");
    assert_eq!(id.contract, "Token");
    assert_eq!(id.signature, "test_transfer(uint256,address)");
    assert_eq!(id.version, 3);
    assert_eq!(id.to_string(), "Token.test_transfer(uint256,address):3");
    assert_eq!(id.test_name(), "Token.test_transfer(uint256,address)");

    assert!(ProofId::parse("no-version").is_err());
    assert!(ProofId::parse("noDot:1").is_err());
}

#[test]
fn test_file_stem_is_filesystem_safe() {
    let id = ProofId::new("Token", "test_transfer(uint256,address)", 2);
    let stem = id.file_stem();
    assert!(!stem.contains('(') && !stem.contains(')') && !stem.contains(','));
    assert!(stem.ends_with("_2"));
}

#[test]
fn test_pending_excludes_target_stuck_and_refuted() {
    let mut proof = seeded_proof("test_pending");
    let nodes = chain(&mut proof, &[1, 1]);
    // Frontier is the chain tip; init has an outgoing edge now.
    assert_eq!(proof.pending(), vec![nodes[1]]);

    proof.stuck.insert(nodes[1]);
    assert!(proof.pending().is_empty());
    proof.stuck.clear();

    let subproof = ProofId::new("Example", "sub()", 0);
    proof.refute(nodes[1], subproof).expect("refute");
    assert!(proof.pending().is_empty());
}

#[test]
fn test_refute_unrefute_is_a_pure_toggle() {
    let mut proof = seeded_proof("test_toggle");
    let nodes = chain(&mut proof, &[2]);
    let before_graph = serde_json::to_string(&proof.kcfg.to_data()).expect("snapshot");
    let before_pending = proof.pending();

    let subproof = ProofId::new("Example", "sub()", 0);
    proof.refute(nodes[0], subproof).expect("refute");
    assert!(!proof.is_pending(nodes[0]));

    proof.unrefute(nodes[0]).expect("unrefute");
    let after_graph = serde_json::to_string(&proof.kcfg.to_data()).expect("snapshot");
    assert_eq!(before_graph, after_graph, "graph must be untouched");
    assert_eq!(proof.pending(), before_pending);
    assert!(proof.refutations.is_empty());
}

#[test]
fn test_refute_requires_pending() {
    let mut proof = seeded_proof("test_refute_pending");
    let nodes = chain(&mut proof, &[1]);
    let subproof = ProofId::new("Example", "sub()", 0);

    // init has an outgoing edge, so it is not pending.
    assert!(matches!(
        proof.refute(proof.init, subproof.clone()),
        Err(Error::AlreadyTerminal(_))
    ));
    proof.refute(nodes[0], subproof).expect("tip is pending");
    assert!(matches!(
        proof.unrefute(proof.init),
        Err(Error::NotRefuted(_))
    ));
}

#[test]
fn test_cover_rejected_on_refuted_node() {
    let mut proof = seeded_proof("test_cover_refuted");
    let nodes = chain(&mut proof, &[1]);
    let subproof = ProofId::new("Example", "sub()", 0);
    proof.refute(nodes[0], subproof).expect("refute");
    assert!(matches!(
        proof.cover(nodes[0], proof.target),
        Err(Error::CoveredWhileRefuted(_))
    ));
}

#[test]
fn test_status_lifecycle() {
    let mut proof = seeded_proof("test_status");
    let nodes = chain(&mut proof, &[1]);
    proof.update_status();
    assert_eq!(proof.status, ProofStatus::Pending);

    proof.cover(nodes[0], proof.target).expect("cover");
    proof.update_status();
    assert_eq!(proof.status, ProofStatus::Passed);

    proof.failing.insert(nodes[0]);
    proof.update_status();
    assert_eq!(proof.status, ProofStatus::Failed);
}

#[test]
fn test_remove_node_protects_init_and_target_and_cleans_bookkeeping() {
    let mut proof = seeded_proof("test_remove");
    let nodes = chain(&mut proof, &[1, 1]);

    assert!(matches!(
        proof.remove_node(proof.init),
        Err(Error::ProtectedNode(_, "init"))
    ));
    assert!(matches!(
        proof.remove_node(proof.target),
        Err(Error::ProtectedNode(_, "target"))
    ));

    let subproof = ProofId::new("Example", "sub()", 0);
    proof.refute(nodes[1], subproof.clone()).expect("refute");
    proof.subproofs.push(subproof);
    proof.stuck.insert(nodes[1]);
    proof.failing.insert(nodes[1]);

    let removed = proof.remove_node(nodes[0]).expect("remove");
    assert_eq!(removed, nodes);
    assert!(proof.stuck.is_empty());
    assert!(proof.failing.is_empty());
    assert!(proof.refutations.is_empty());
    assert!(proof.subproofs.is_empty());
}

#[test]
fn test_data_round_trip() {
    let mut proof = seeded_proof("test_persist");
    let nodes = chain(&mut proof, &[3]);
    proof.stuck.insert(nodes[0]);
    proof.failing.insert(nodes[0]);
    proof.update_status();

    let data = proof.to_data();
    let text = serde_json::to_string(&data).expect("serialize");
    let back = Proof::from_data(serde_json::from_str(&text).expect("deserialize")).expect("rebuild");

    assert_eq!(back.id, proof.id);
    assert_eq!(back.init, proof.init);
    assert_eq!(back.target, proof.target);
    assert_eq!(back.status, ProofStatus::Failed);
    assert_eq!(back.stuck, proof.stuck);
    assert_eq!(back.kcfg.node_count(), proof.kcfg.node_count());
}
