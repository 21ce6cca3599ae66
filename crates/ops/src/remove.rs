//! Subtree removal

use crate::{OpOutcome, Operation, Result};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_core::Proof;
use athanor_engine::Engine;

/// Prunes a node and everything reachable only through it. Digest
/// tracking is untouched: digests follow source identity, not graph
/// shape.
#[derive(Debug, Clone)]
pub struct RemoveNode {
    /// Root of the subtree to remove.
    pub node: NodeId,
}

#[async_trait]
impl Operation for RemoveNode {
    fn name(&self) -> &'static str {
        "remove-node"
    }

    async fn apply(&self, proof: &mut Proof, _engine: &dyn Engine) -> Result<OpOutcome> {
        let removed = proof.remove_node(self.node)?;
        tracing::info!(node = %self.node, count = removed.len(), "removed subtree");
        Ok(OpOutcome {
            removed,
            ..OpOutcome::default()
        })
    }
}
