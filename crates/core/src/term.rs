//! Symbolic terms and configurations
//!
//! Terms are opaque to the core: the rewrite engine is the only component
//! that interprets them. The core only needs syntactic equality,
//! substitution, free-variable collection, and anti-unification.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A substitution from variable names to terms.
pub type Subst = BTreeMap<String, Term>;

/// An opaque symbolic term exchanged with the rewrite engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A free symbolic variable.
    Var(String),
    /// An unbounded integer literal, stored as a decimal string so that
    /// 256-bit EVM words survive the JSON round-trip unmangled.
    Int(String),
    /// A boolean literal.
    Bool(bool),
    /// A byte-string literal (program code, calldata prefixes).
    Bytes(#[serde(with = "hex::serde")] Vec<u8>),
    /// An applied constructor; the label is engine-defined.
    App(String, Vec<Term>),
}

impl Term {
    /// Builds a variable term.
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    /// Builds an integer literal from anything displayable as decimal.
    pub fn int(value: impl fmt::Display) -> Self {
        Term::Int(value.to_string())
    }

    /// Conjunction of two boolean terms.
    pub fn and(lhs: Term, rhs: Term) -> Self {
        Term::App("andBool".into(), vec![lhs, rhs])
    }

    /// Disjunction of two boolean terms.
    pub fn or(lhs: Term, rhs: Term) -> Self {
        Term::App("orBool".into(), vec![lhs, rhs])
    }

    /// Negation of a boolean term.
    pub fn not(term: Term) -> Self {
        Term::App("notBool".into(), vec![term])
    }

    /// Integer equality.
    pub fn eq_int(lhs: Term, rhs: Term) -> Self {
        Term::App("==Int".into(), vec![lhs, rhs])
    }

    /// Integer disequality.
    pub fn neq_int(lhs: Term, rhs: Term) -> Self {
        Term::App("=/=Int".into(), vec![lhs, rhs])
    }

    /// Non-strict integer ordering.
    pub fn le_int(lhs: Term, rhs: Term) -> Self {
        Term::App("<=Int".into(), vec![lhs, rhs])
    }

    /// Strict integer ordering.
    pub fn lt_int(lhs: Term, rhs: Term) -> Self {
        Term::App("<Int".into(), vec![lhs, rhs])
    }

    /// Boolean equality.
    pub fn eq_bool(lhs: Term, rhs: Term) -> Self {
        Term::App("==Bool".into(), vec![lhs, rhs])
    }

    /// Range constraint `0 <= var < 2^bits`, the shape every fixed-width
    /// ABI type constraint reduces to.
    pub fn unsigned_range(var: Term, bits: u32) -> Self {
        let upper = pow2_string(bits);
        Term::and(
            Term::le_int(Term::int(0u8), var.clone()),
            Term::lt_int(var, Term::Int(upper)),
        )
    }

    /// Folds a conjunction over an iterator of boolean terms, or `true`
    /// when the iterator is empty.
    pub fn conjoin(terms: impl IntoIterator<Item = Term>) -> Self {
        let mut iter = terms.into_iter();
        let Some(first) = iter.next() else {
            return Term::Bool(true);
        };
        iter.fold(first, Term::and)
    }

    /// Collects the free variable names of this term into `out`.
    pub fn free_vars(&self, out: &mut BTreeSet<String>) {
        match self {
            Term::Var(name) => {
                out.insert(name.clone());
            }
            Term::App(_, args) => {
                for arg in args {
                    arg.free_vars(out);
                }
            }
            _ => {}
        }
    }

    /// Applies a substitution, leaving unmapped variables untouched.
    pub fn subst(&self, subst: &Subst) -> Term {
        match self {
            Term::Var(name) => subst.get(name).cloned().unwrap_or_else(|| self.clone()),
            Term::App(label, args) => Term::App(
                label.clone(),
                args.iter().map(|arg| arg.subst(subst)).collect(),
            ),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{name}"),
            Term::Int(value) => write!(f, "{value}"),
            Term::Bool(value) => write!(f, "{value}"),
            Term::Bytes(data) => write!(f, "0x{}", hex::encode(data)),
            Term::App(label, args) => {
                write!(f, "{label}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Decimal rendering of `2^bits` without a bignum dependency.
fn pow2_string(bits: u32) -> String {
    // Schoolbook doubling over decimal digits, little-endian.
    let mut digits = vec![1u8];
    for _ in 0..bits {
        let mut carry = 0u8;
        for digit in digits.iter_mut() {
            let doubled = *digit * 2 + carry;
            *digit = doubled % 10;
            carry = doubled / 10;
        }
        if carry > 0 {
            digits.push(carry);
        }
    }
    digits.iter().rev().map(|d| (b'0' + d) as char).collect()
}

/// Monotone fresh-variable source used by anti-unification and the state
/// builder. Counters are per-graph so generated names never collide with
/// previously allocated ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreshVars {
    counter: u64,
}

impl FreshVars {
    /// Resumes a counter at a known floor (used after loading a persisted
    /// proof so new names stay disjoint from stored ones).
    pub fn starting_at(counter: u64) -> Self {
        Self { counter }
    }

    /// Allocates the next fresh name with the given prefix.
    pub fn fresh(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}{}", self.counter);
        self.counter += 1;
        name
    }
}

/// Anti-unification: computes the least general generalization of two
/// terms. Mismatching sub-term pairs are replaced by fresh variables; the
/// same pair always maps to the same variable, and the witnessing
/// substitutions for both sides are accumulated into `lhs` and `rhs`.
pub fn anti_unify(
    a: &Term,
    b: &Term,
    fresh: &mut FreshVars,
    seen: &mut HashMap<(Term, Term), String>,
    lhs: &mut Subst,
    rhs: &mut Subst,
) -> Term {
    if a == b {
        return a.clone();
    }
    if let (Term::App(la, args_a), Term::App(lb, args_b)) = (a, b)
        && la == lb
        && args_a.len() == args_b.len()
    {
        let args = args_a
            .iter()
            .zip(args_b)
            .map(|(x, y)| anti_unify(x, y, fresh, seen, lhs, rhs))
            .collect();
        return Term::App(la.clone(), args);
    }

    let key = (a.clone(), b.clone());
    let name = seen
        .entry(key)
        .or_insert_with(|| fresh.fresh("W"))
        .clone();
    lhs.insert(name.clone(), a.clone());
    rhs.insert(name.clone(), b.clone());
    Term::Var(name)
}

/// Cells that must match syntactically before two configurations may be
/// merged; they pin down which code path a state is executing.
pub const STRUCTURAL_CELLS: &[&str] = &["program", "pc", "callDepth", "jumpDests"];

/// A symbolic configuration: named cells plus a path-constraint set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CTerm {
    cells: BTreeMap<String, Term>,
    constraints: Vec<Term>,
}

impl CTerm {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell assignment.
    pub fn with_cell(mut self, name: impl Into<String>, value: Term) -> Self {
        self.cells.insert(name.into(), value);
        self
    }

    /// Builder-style constraint addition.
    pub fn with_constraint(mut self, constraint: Term) -> Self {
        self.add_constraint(constraint);
        self
    }

    /// Returns the named cell, if present.
    pub fn cell(&self, name: &str) -> Option<&Term> {
        self.cells.get(name)
    }

    /// Writes or overwrites a cell.
    pub fn set_cell(&mut self, name: impl Into<String>, value: Term) {
        self.cells.insert(name.into(), value);
    }

    /// Iterates over cells in name order.
    pub fn cells(&self) -> impl Iterator<Item = (&String, &Term)> {
        self.cells.iter()
    }

    /// Appends a path constraint, dropping syntactic duplicates.
    pub fn add_constraint(&mut self, constraint: Term) {
        if matches!(constraint, Term::Bool(true)) {
            return;
        }
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
    }

    /// The path-constraint conjuncts in insertion order.
    pub fn constraints(&self) -> &[Term] {
        &self.constraints
    }

    /// Replaces the full constraint set (simplification results).
    pub fn set_constraints(&mut self, constraints: Vec<Term>) {
        self.constraints.clear();
        for constraint in constraints {
            self.add_constraint(constraint);
        }
    }

    /// Collects free variables across all cells and constraints.
    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for term in self.cells.values().chain(self.constraints.iter()) {
            term.free_vars(&mut out);
        }
        out
    }

    /// Names of structural cells on which `self` and `other` disagree.
    /// A cell missing on one side counts as a disagreement.
    pub fn structural_mismatches(&self, other: &CTerm) -> Vec<String> {
        STRUCTURAL_CELLS
            .iter()
            .filter(|cell| self.cell(cell) != other.cell(cell))
            .map(|cell| cell.to_string())
            .collect()
    }

    /// Applies a substitution to every cell and constraint.
    pub fn subst(&self, subst: &Subst) -> CTerm {
        let mut out = CTerm::new();
        for (name, term) in &self.cells {
            out.cells.insert(name.clone(), term.subst(subst));
        }
        for constraint in &self.constraints {
            out.add_constraint(constraint.subst(subst));
        }
        out
    }
}

/// Anti-unifies a non-empty set of configurations cell-wise, producing the
/// generalized configuration plus one witnessing substitution per input.
/// Constraints are not generalized here; the caller decides whether to
/// attach a disjunction of the originals.
pub fn anti_unify_all(configs: &[&CTerm], fresh: &mut FreshVars) -> (CTerm, Vec<Subst>) {
    assert!(!configs.is_empty(), "anti_unify_all requires input configs");

    let mut generalized = configs[0].clone();
    let mut substs = vec![Subst::new(); configs.len()];

    for (idx, config) in configs.iter().enumerate().skip(1) {
        let mut seen = HashMap::new();
        let mut lhs = Subst::new();
        let mut rhs = Subst::new();
        let mut merged = CTerm::new();

        let names: BTreeSet<&String> =
            generalized.cells.keys().chain(config.cells.keys()).collect();
        for name in names {
            match (generalized.cell(name), config.cell(name)) {
                (Some(a), Some(b)) => {
                    merged.set_cell(name.clone(), anti_unify(a, b, fresh, &mut seen, &mut lhs, &mut rhs));
                }
                // A cell only one side carries cannot be generalized
                // structurally; it becomes fresh and is witnessed on the
                // side that has it.
                (Some(a), None) => {
                    let var = fresh.fresh("W");
                    lhs.insert(var.clone(), a.clone());
                    merged.set_cell(name.clone(), Term::Var(var));
                }
                (None, Some(b)) => {
                    let var = fresh.fresh("W");
                    rhs.insert(var.clone(), b.clone());
                    merged.set_cell(name.clone(), Term::Var(var));
                }
                (None, None) => unreachable!(),
            }
        }

        // Earlier witnesses compose through the new generalization step.
        for earlier in substs.iter_mut().take(idx) {
            let composed: Subst = lhs
                .iter()
                .map(|(name, term)| (name.clone(), term.subst(earlier)))
                .collect();
            earlier.extend(composed);
        }
        substs[idx] = rhs;
        generalized = merged;
    }

    (generalized, substs)
}
