//! Edge sectioning
//!
//! Replaces one opaque multi-step edge with a chain of shorter edges
//! through fresh checkpoint nodes, by re-running bounded-depth steps
//! between the edge's endpoints. All engine work happens before the
//! graph is touched, so a mid-flight engine failure leaves the edge
//! intact.

use crate::{Error, OpOutcome, Operation, Result};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_core::term::CTerm;
use athanor_core::Proof;
use athanor_engine::protocol::{StepLimits, StepResult};
use athanor_engine::Engine;

/// Subdivides the edge between two connected nodes into `sections`
/// shorter edges through `sections - 1` new intermediate nodes. The new
/// depths always sum to the original edge's depth.
#[derive(Debug, Clone)]
pub struct SectionEdge {
    /// Source of the edge to subdivide.
    pub source: NodeId,
    /// Target of the edge to subdivide.
    pub target: NodeId,
    /// Number of pieces; at least two.
    pub sections: usize,
}

#[async_trait]
impl Operation for SectionEdge {
    fn name(&self) -> &'static str {
        "section-edge"
    }

    async fn apply(&self, proof: &mut Proof, engine: &dyn Engine) -> Result<OpOutcome> {
        let depth = proof
            .kcfg
            .edge_depth(self.source, self.target)
            .ok_or(athanor_core::Error::EdgeMissing {
                src: self.source,
                target: self.target,
            })?;
        if self.sections < 2 || self.sections > depth {
            return Err(Error::InvalidSectionCount {
                sections: self.sections,
                depth,
            });
        }

        let stride = depth.div_ceil(self.sections);
        let limits = StepLimits {
            max_depth: stride,
            ..StepLimits::default()
        };

        // Re-run the prefix of the edge one bounded step at a time,
        // collecting the checkpoint states before mutating anything.
        let mut checkpoints: Vec<(CTerm, usize)> = Vec::with_capacity(self.sections - 1);
        let mut state = proof.kcfg.node(self.source)?.cterm.clone();
        let mut consumed = 0usize;
        for _ in 0..self.sections - 1 {
            match engine.step(&state, &limits).await? {
                StepResult::Advance { state: next, depth: used } => {
                    let used = used.max(1);
                    consumed += used;
                    if consumed >= depth {
                        return Err(Error::SectionDiverged(format!(
                            "checkpoints consumed {consumed} of {depth} steps"
                        )));
                    }
                    checkpoints.push((next.clone(), used));
                    state = next;
                }
                StepResult::Branch { .. } => {
                    return Err(Error::SectionDiverged(
                        "engine branched inside a previously linear edge".to_string(),
                    ));
                }
                StepResult::Stuck => {
                    return Err(Error::SectionDiverged(
                        "engine got stuck inside a previously verified edge".to_string(),
                    ));
                }
            }
        }

        proof.kcfg.remove_edge(self.source, self.target)?;
        let mut created = Vec::with_capacity(checkpoints.len());
        let mut previous = self.source;
        for (checkpoint, used) in checkpoints {
            let node = proof.kcfg.create_node(checkpoint);
            proof.kcfg.create_edge(previous, node, used)?;
            created.push(node);
            previous = node;
        }
        proof.kcfg.create_edge(previous, self.target, depth - consumed)?;
        tracing::info!(
            source = %self.source,
            target = %self.target,
            sections = self.sections,
            ?created,
            "sectioned edge"
        );

        Ok(OpOutcome {
            created,
            ..OpOutcome::default()
        })
    }
}
