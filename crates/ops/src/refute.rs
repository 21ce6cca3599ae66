//! Refutation: deferring a branch to an independent subproof

use crate::{Error, OpOutcome, Operation, Result};
use async_trait::async_trait;
use athanor_core::kcfg::{Kcfg, NodeId};
use athanor_core::term::Term;
use athanor_core::{Proof, ProofId};
use athanor_engine::Engine;

/// Removes a pending node from the frontier by turning its remaining
/// obligation into a detachable claim: under the node's path condition
/// minus its last constraint, the last constraint cannot hold. The
/// subproof is returned for the caller to persist; the node itself is
/// kept in the graph.
#[derive(Debug, Clone)]
pub struct RefuteNode {
    /// The pending node to refute.
    pub node: NodeId,
}

/// Deletes the refutation association, restoring the node to pending.
#[derive(Debug, Clone)]
pub struct UnrefuteNode {
    /// The refuted node.
    pub node: NodeId,
}

#[async_trait]
impl Operation for RefuteNode {
    fn name(&self) -> &'static str {
        "refute-node"
    }

    async fn apply(&self, proof: &mut Proof, _engine: &dyn Engine) -> Result<OpOutcome> {
        if !proof.is_pending(self.node) {
            return Err(Error::NotPending(self.node));
        }
        let config = proof.kcfg.node(self.node)?.cterm.clone();
        let Some((last, prefix)) = config.constraints().split_last() else {
            return Err(Error::NothingToRefute(self.node));
        };

        // The claim: the path prefix refutes the final branch condition.
        let mut init_config = config.clone();
        init_config.set_constraints(prefix.to_vec());
        let mut target_config = init_config.clone();
        target_config.add_constraint(Term::not(last.clone()));

        let mut kcfg = Kcfg::new();
        let init = kcfg.create_node(init_config);
        let target = kcfg.create_node(target_config);
        let subproof_id = ProofId::new(
            proof.id.contract.clone(),
            format!("{}#refute-node-{}", proof.id.signature, self.node),
            proof.id.version,
        );
        let subproof = Proof::new(subproof_id.clone(), kcfg, init, target)?;

        proof.refute(self.node, subproof_id.clone())?;
        proof.subproofs.push(subproof_id.clone());
        tracing::info!(node = %self.node, subproof = %subproof_id, "refuted node");

        Ok(OpOutcome {
            subproof: Some((subproof_id, subproof)),
            ..OpOutcome::default()
        })
    }
}

#[async_trait]
impl Operation for UnrefuteNode {
    fn name(&self) -> &'static str {
        "unrefute-node"
    }

    async fn apply(&self, proof: &mut Proof, _engine: &dyn Engine) -> Result<OpOutcome> {
        let subproof_id = proof.unrefute(self.node)?;
        proof.subproofs.retain(|candidate| *candidate != subproof_id);
        tracing::info!(node = %self.node, subproof = %subproof_id, "restored node to pending");
        Ok(OpOutcome::default())
    }
}
