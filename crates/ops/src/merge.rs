//! Node merging via anti-unification

use crate::{Error, OpOutcome, Operation, Result};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_core::term::{CTerm, Term, anti_unify_all};
use athanor_core::Proof;
use athanor_engine::Engine;
use std::collections::BTreeSet;

/// Anti-unifies a set of nodes into one generalized node, covering each
/// original by the result.
///
/// Merging is only sound between nodes executing the same code path, so
/// the structural cells of every candidate must agree syntactically.
/// `include_disjunct` attaches the disjunction of the original
/// constraint sets to the generalized node: more precise, but the
/// constraint grows with every merged branch.
#[derive(Debug, Clone)]
pub struct MergeNodes {
    /// Nodes to merge; at least two.
    pub nodes: Vec<NodeId>,
    /// Whether to keep the originals' constraints as a disjunction.
    pub include_disjunct: bool,
}

#[async_trait]
impl Operation for MergeNodes {
    fn name(&self) -> &'static str {
        "merge-nodes"
    }

    async fn apply(&self, proof: &mut Proof, _engine: &dyn Engine) -> Result<OpOutcome> {
        if self.nodes.len() < 2 {
            return Err(Error::TooFewNodes {
                needed: 2,
                got: self.nodes.len(),
            });
        }

        // Validate everything before touching the graph: every candidate
        // must exist, be a leaf (a merged node gains a cover, which is
        // its one terminal disposition), and not be refuted.
        let mut configs: Vec<CTerm> = Vec::with_capacity(self.nodes.len());
        for &node in &self.nodes {
            let knode = proof.kcfg.node(node)?;
            if !proof.kcfg.is_leaf(node) {
                return Err(Error::Core(athanor_core::Error::AlreadyTerminal(node)));
            }
            if proof.refutations.contains_key(&node) {
                return Err(Error::Core(athanor_core::Error::CoveredWhileRefuted(node)));
            }
            configs.push(knode.cterm.clone());
        }

        let mut mismatched: BTreeSet<String> = BTreeSet::new();
        for config in &configs[1..] {
            mismatched.extend(configs[0].structural_mismatches(config));
        }
        if !mismatched.is_empty() {
            return Err(Error::StructuralMismatch {
                cells: mismatched.into_iter().collect(),
            });
        }

        let refs: Vec<&CTerm> = configs.iter().collect();
        let (mut generalized, _witnesses) = anti_unify_all(&refs, &mut proof.fresh);

        if self.include_disjunct {
            let disjunct = configs
                .iter()
                .map(|config| Term::conjoin(config.constraints().iter().cloned()))
                .reduce(Term::or);
            generalized.set_constraints(Vec::new());
            if let Some(disjunct) = disjunct {
                generalized.add_constraint(disjunct);
            }
        } else {
            generalized.set_constraints(Vec::new());
        }

        let merged = proof.kcfg.create_node(generalized);
        for &node in &self.nodes {
            proof.cover(node, merged)?;
        }
        tracing::info!(
            nodes = ?self.nodes,
            %merged,
            include_disjunct = self.include_disjunct,
            "merged nodes"
        );

        Ok(OpOutcome {
            created: vec![merged],
            ..OpOutcome::default()
        })
    }
}
