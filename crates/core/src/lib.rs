pub mod digest;
pub mod kcfg;
pub mod pred;
pub mod proof;
pub mod result;
pub mod store;
pub mod term;

pub use kcfg::{Kcfg, KEdge, KNode, NodeId};
pub use proof::{Proof, ProofId, ProofStatus};
pub use result::{Error, Result};
pub use term::{CTerm, FreshVars, Subst, Term};

/// Returns true if the method name requests the inverted (failure)
/// target predicate.
///
/// Tests named with a `testFail`/`checkFail`/`proveFail` prefix assert
/// that the method reverts; their target selects the failure predicate
/// instead of the success predicate.
#[inline]
pub fn is_fail_test(method_name: &str) -> bool {
    ["testFail", "checkFail", "proveFail"]
        .iter()
        .any(|prefix| method_name.starts_with(prefix))
}

/// Returns true if the method name marks a verification entry point.
///
/// Entry points use the `test`/`check`/`prove` prefixes, mirroring the
/// collection convention of Foundry-style test suites.
#[inline]
pub fn is_test_method(method_name: &str) -> bool {
    ["test", "check", "prove"]
        .iter()
        .any(|prefix| method_name.starts_with(prefix))
}
