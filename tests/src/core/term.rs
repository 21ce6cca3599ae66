use athanor_core::term::{anti_unify, anti_unify_all, CTerm, FreshVars, Subst, Term};
use std::collections::HashMap;

#[test]
fn test_anti_unify_equal_terms_is_identity() {
    let term = Term::App("foo".into(), vec![Term::int(1u8), Term::var("X")]);
    let mut fresh = FreshVars::default();
    let mut seen = HashMap::new();
    let (mut lhs, mut rhs) = (Subst::new(), Subst::new());
    let generalized = anti_unify(&term, &term, &mut fresh, &mut seen, &mut lhs, &mut rhs);
    assert_eq!(generalized, term);
    assert!(lhs.is_empty() && rhs.is_empty());
}

#[test]
fn test_anti_unify_mismatch_creates_shared_variable() {
    // The same (lhs, rhs) pair must map to the same fresh variable on
    // every occurrence.
    let a = Term::App("pair".into(), vec![Term::int(1u8), Term::int(1u8)]);
    let b = Term::App("pair".into(), vec![Term::int(2u8), Term::int(2u8)]);
    let mut fresh = FreshVars::default();
    let mut seen = HashMap::new();
    let (mut lhs, mut rhs) = (Subst::new(), Subst::new());
    let generalized = anti_unify(&a, &b, &mut fresh, &mut seen, &mut lhs, &mut rhs);

    let Term::App(label, args) = &generalized else {
        panic!("expected an application, got {generalized:?}");
    };
    assert_eq!(label, "pair");
    assert_eq!(args[0], args[1], "repeated mismatch must reuse one variable");
    let Term::Var(name) = &args[0] else {
        panic!("expected a fresh variable");
    };
    assert_eq!(lhs.get(name), Some(&Term::int(1u8)));
    assert_eq!(rhs.get(name), Some(&Term::int(2u8)));
}

#[test]
fn test_anti_unify_all_witnesses_every_input() {
    let configs: Vec<CTerm> = (0..3)
        .map(|idx| {
            CTerm::new()
                .with_cell("pc", Term::int(7u8))
                .with_cell("counter", Term::int(idx as u8))
        })
        .collect();
    let refs: Vec<&CTerm> = configs.iter().collect();
    let mut fresh = FreshVars::default();
    let (generalized, witnesses) = anti_unify_all(&refs, &mut fresh);

    assert_eq!(generalized.cell("pc"), Some(&Term::int(7u8)));
    assert!(matches!(generalized.cell("counter"), Some(Term::Var(_))));
    assert_eq!(witnesses.len(), 3);
    for (idx, witness) in witnesses.iter().enumerate() {
        let original = generalized.subst(witness);
        assert_eq!(
            original.cell("counter"),
            configs[idx].cell("counter"),
            "witness {idx} must recover the original cell"
        );
    }
}

#[test]
fn test_unsigned_range_bounds() {
    let range = Term::unsigned_range(Term::var("V"), 8);
    let Term::App(label, args) = &range else {
        panic!("expected a conjunction");
    };
    assert_eq!(label, "andBool");
    let Term::App(_, upper_args) = &args[1] else {
        panic!("expected an upper bound comparison");
    };
    assert_eq!(upper_args[1], Term::Int("256".to_string()));

    let word = Term::unsigned_range(Term::var("V"), 256);
    let Term::App(_, args) = &word else {
        panic!("expected a conjunction");
    };
    let Term::App(_, upper_args) = &args[1] else {
        panic!("expected an upper bound comparison");
    };
    let Term::Int(decimal) = &upper_args[1] else {
        panic!("expected an integer bound");
    };
    assert_eq!(decimal.len(), 78, "2^256 has 78 decimal digits");
    assert!(decimal.starts_with("115792089237316195423570985008687907853"));
}

#[test]
fn test_conjoin_empty_is_true() {
    assert_eq!(Term::conjoin(Vec::new()), Term::Bool(true));
}

#[test]
fn test_cterm_constraint_dedup() {
    let mut cterm = CTerm::new();
    let constraint = Term::eq_int(Term::var("X"), Term::int(3u8));
    cterm.add_constraint(constraint.clone());
    cterm.add_constraint(constraint);
    cterm.add_constraint(Term::Bool(true));
    assert_eq!(cterm.constraints().len(), 1);
}

#[test]
fn test_cterm_serde_round_trip() {
    let cterm = CTerm::new()
        .with_cell("program", Term::Bytes(vec![0x60, 0x80]))
        .with_cell("pc", Term::int(0u8))
        .with_constraint(Term::unsigned_range(Term::var("V0"), 160));
    let text = serde_json::to_string(&cterm).expect("serialize");
    let back: CTerm = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back, cterm);
}

#[test]
fn test_structural_mismatches_reports_cells() {
    let a = CTerm::new()
        .with_cell("program", Term::Bytes(vec![1]))
        .with_cell("pc", Term::int(4u8));
    let b = CTerm::new()
        .with_cell("program", Term::Bytes(vec![1]))
        .with_cell("pc", Term::int(8u8));
    assert_eq!(a.structural_mismatches(&b), vec!["pc".to_string()]);
    assert!(a.structural_mismatches(&a.clone()).is_empty());
}
