use crate::support::example_contract;
use athanor_core::kcfg::Kcfg;
use athanor_core::term::{CTerm, Term};
use athanor_core::{Proof, ProofId, ProofStatus};
use athanor_prove::{seed_proof, BuildConfig, Error, Method};

fn proof_id(signature: &str) -> ProofId {
    ProofId::new("Example", signature, 0)
}

/// A completed setup proof with `finals` reachable final states, each
/// carrying a recognizable accounts cell and one path constraint.
fn passed_setup(finals: usize) -> Proof {
    let mut kcfg = Kcfg::new();
    let init = kcfg.create_node(CTerm::new().with_cell("pc", Term::int(0u8)));
    let target = kcfg.create_node(CTerm::new().with_cell("statusCode", Term::var("VStatus")));
    for index in 0..finals {
        let state = CTerm::new()
            .with_cell("pc", Term::int(0u8))
            .with_cell(
                "accounts",
                Term::App("accounts".into(), vec![Term::int(index as u8)]),
            )
            .with_cell("number", Term::var(format!("VSetupNumber{index}")))
            .with_constraint(Term::unsigned_range(
                Term::var(format!("VSetupNumber{index}")),
                256,
            ));
        let node = kcfg.create_node(state);
        kcfg.create_edge(init, node, 1).expect("edge");
        kcfg.create_cover(node, target).expect("cover");
    }
    let mut proof = Proof::new(proof_id("setUp()"), kcfg, init, target).expect("setup proof");
    proof.update_status();
    assert_eq!(proof.status, ProofStatus::Passed);
    proof
}

#[test]
fn test_fail_named_test_negates_the_success_predicate() {
    let contract = example_contract();
    let config = BuildConfig::default();

    let positive = seed_proof(
        proof_id("test_assert_true(uint256)"),
        &contract,
        contract.method("test_assert_true").expect("method"),
        None,
        &config,
    )
    .expect("seed");
    let negative = seed_proof(
        proof_id("testFail_assert_true(uint256)"),
        &contract,
        contract.method("testFail_assert_true").expect("method"),
        None,
        &config,
    )
    .expect("seed");

    let success = positive
        .kcfg
        .node(positive.target)
        .expect("target")
        .cterm
        .constraints()
        .to_vec();
    let failure = negative
        .kcfg
        .node(negative.target)
        .expect("target")
        .cterm
        .constraints()
        .to_vec();

    assert_eq!(success.len(), 1);
    assert_eq!(failure.len(), 1);
    assert_eq!(
        failure[0],
        Term::not(success[0].clone()),
        "fail-named target must be the exact negation"
    );
}

#[test]
fn test_initial_state_constrains_special_addresses() {
    let contract = example_contract();
    let method = contract.method("test_assert_true").expect("method");
    let proof = seed_proof(
        proof_id("test_assert_true(uint256)"),
        &contract,
        method,
        None,
        &BuildConfig::default(),
    )
    .expect("seed");

    let init = proof.kcfg.node(proof.init).expect("init");
    assert_eq!(
        init.cterm.cell("program"),
        Some(&Term::Bytes(contract.deployed_bytecode.clone()))
    );
    assert_eq!(init.cterm.cell("callValue"), Some(&Term::int(0u8)));
    for cell in ["id", "caller", "origin"] {
        assert!(matches!(init.cterm.cell(cell), Some(Term::Var(_))));
    }
    // One disequality against the cheat-code address per special address.
    let cheat_disequalities = init
        .cterm
        .constraints()
        .iter()
        .filter(|constraint| {
            matches!(constraint, Term::App(label, _) if label == "=/=Int")
        })
        .count();
    assert_eq!(cheat_disequalities, 3);
}

#[test]
fn test_grafting_copies_each_final_reachable_state() {
    let contract = example_contract();
    let method = contract.method("test_assert_true").expect("method");
    let setup = passed_setup(2);
    let finals = setup.kcfg.covers_into(setup.target);

    let config = BuildConfig {
        graft: true,
        ..BuildConfig::default()
    };
    let proof = seed_proof(
        proof_id("test_assert_true(uint256)"),
        &contract,
        method,
        Some(&setup),
        &config,
    )
    .expect("seed");

    // target + one (copy, entry) pair per setup final state.
    assert_eq!(proof.kcfg.node_count(), 1 + 2 * finals.len());
    assert_eq!(proof.pending().len(), finals.len());
    assert!(proof.subproofs.contains(&setup.id));

    // Every copy matches its setup final state and feeds exactly one
    // grafted entry through a direct edge.
    let mut matched = 0;
    for node_id in proof.kcfg.node_ids() {
        let node = proof.kcfg.node(node_id).expect("node");
        let Some(accounts) = node.cterm.cell("accounts") else {
            continue;
        };
        let Some((entry, _)) = proof
            .kcfg
            .out_edges(node_id)
            .into_iter()
            .find(|(_, edge)| matches!(edge, athanor_core::kcfg::KEdge::Step { depth: 1 }))
        else {
            continue;
        };
        matched += 1;
        let grafted = proof.kcfg.node(entry).expect("entry");
        assert_eq!(
            grafted.cterm.cell("accounts"),
            Some(accounts),
            "allow-listed cells must be copied forward"
        );
        assert!(
            grafted.cterm.cell("callData").is_some(),
            "grafted entries still carry the freshly built call"
        );
    }
    assert_eq!(matched, finals.len());
}

#[test]
fn test_branching_setup_without_graft_is_an_error() {
    let contract = example_contract();
    let method = contract.method("test_assert_true").expect("method");
    let setup = passed_setup(2);

    let err = seed_proof(
        proof_id("test_assert_true(uint256)"),
        &contract,
        method,
        Some(&setup),
        &BuildConfig::default(),
    )
    .expect_err("must fail");
    assert!(matches!(err, Error::UngraftableBranching { states: 2, .. }));

    // A single final state grafts fine even with grafting disabled.
    let linear = passed_setup(1);
    seed_proof(
        proof_id("test_assert_true(uint256)"),
        &contract,
        method,
        Some(&linear),
        &BuildConfig::default(),
    )
    .expect("single final state");
}

#[test]
fn test_pending_setup_is_not_graftable() {
    let contract = example_contract();
    let method = contract.method("test_assert_true").expect("method");
    let mut setup = passed_setup(1);
    setup.status = ProofStatus::Pending;

    assert!(matches!(
        seed_proof(
            proof_id("test_assert_true(uint256)"),
            &contract,
            method,
            Some(&setup),
            &BuildConfig::default(),
        ),
        Err(Error::SetupNotPassed { .. })
    ));
}

#[test]
fn test_dynamic_array_without_bound_fails() {
    let contract = example_contract();
    let inputs: Vec<alloy::json_abi::Param> =
        serde_json::from_str(r#"[{"name": "xs", "type": "uint256[]", "internalType": "uint256[]"}]"#)
            .expect("param fixture");
    let method = Method {
        name: "test_sum".to_string(),
        inputs,
        payable: false,
        ast: None,
    };

    let err = seed_proof(
        proof_id("test_sum(uint256[])"),
        &contract,
        &method,
        None,
        &BuildConfig::default(),
    )
    .expect_err("must fail");
    assert!(matches!(
        err,
        Error::MissingLengthBound { parameter, .. } if parameter == "xs"
    ));

    // A supplied bound unblocks construction.
    let mut config = BuildConfig::default();
    config.lengths.insert("xs".to_string(), 3);
    seed_proof(proof_id("test_sum(uint256[])"), &contract, &method, None, &config)
        .expect("bounded array");
}

#[test]
fn test_payable_method_gets_symbolic_call_value() {
    let contract = example_contract();
    let method = Method {
        name: "test_deposit".to_string(),
        inputs: Vec::new(),
        payable: true,
        ast: None,
    };
    let proof = seed_proof(
        proof_id("test_deposit()"),
        &contract,
        &method,
        None,
        &BuildConfig::default(),
    )
    .expect("seed");
    let init = proof.kcfg.node(proof.init).expect("init");
    assert!(matches!(init.cterm.cell("callValue"), Some(Term::Var(_))));
}

#[test]
fn test_constructor_requires_init_bytecode() {
    let mut contract = example_contract();
    contract.init_bytecode = Vec::new();
    let constructor = contract.constructor.clone().expect("constructor");

    assert!(matches!(
        seed_proof(
            proof_id("constructor()"),
            &contract,
            &constructor,
            None,
            &BuildConfig::default(),
        ),
        Err(Error::MissingConstructor(_))
    ));
}
