//! Manual case splits

use crate::{Error, OpOutcome, Operation, Result};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_core::pred::parse_predicate;
use athanor_core::term::Term;
use athanor_core::Proof;
use athanor_engine::Engine;
use std::collections::BTreeSet;

/// Branches a pending node on an explicit boolean condition the engine
/// did not discover on its own.
///
/// The node is copied once per branch — the condition on one side, its
/// negation on the other — and the original becomes non-pending with a
/// split disposition.
#[derive(Debug, Clone)]
pub struct SplitNode {
    /// The node to branch.
    pub node: NodeId,
    /// Condition text, e.g. `"VAmount <= 1000"`.
    pub condition: String,
}

#[async_trait]
impl Operation for SplitNode {
    fn name(&self) -> &'static str {
        "split-node"
    }

    async fn apply(&self, proof: &mut Proof, _engine: &dyn Engine) -> Result<OpOutcome> {
        if !proof.is_pending(self.node) {
            return Err(Error::NotPending(self.node));
        }
        let condition = parse_predicate(&self.condition).map_err(Error::Core)?;

        let config = proof.kcfg.node(self.node)?.cterm.clone();
        let bound = config.free_vars();
        let mut used = BTreeSet::new();
        condition.free_vars(&mut used);
        if let Some(unknown) = used.difference(&bound).next() {
            return Err(Error::UnknownVariable(unknown.clone()));
        }

        let branches = [condition.clone(), Term::not(condition)];
        let mut created = Vec::with_capacity(branches.len());
        for branch_condition in branches {
            let branch = config.clone().with_constraint(branch_condition);
            created.push(proof.kcfg.create_node(branch));
        }
        proof.kcfg.create_split(self.node, &created)?;
        tracing::info!(node = %self.node, condition = %self.condition, ?created, "split node");

        Ok(OpOutcome {
            created,
            ..OpOutcome::default()
        })
    }
}
