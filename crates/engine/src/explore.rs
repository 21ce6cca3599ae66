//! Exploration driver
//!
//! Drives a proof's frontier through the engine until every leaf is
//! subsumed, stuck, or a resource limit is hit. Every applied step
//! persists the graph, so a later resume picks up from the last
//! persisted frontier.

use crate::protocol::{ModelResult, StepLimits, StepResult};
use crate::{Engine, Result};
use athanor_core::kcfg::NodeId;
use athanor_core::store::ProofStore;
use athanor_core::{Proof, Subst};
use std::collections::BTreeSet;
use std::time::Instant;

/// Limits and rule sets for one exploration run.
#[derive(Debug, Clone, Default)]
pub struct ExploreConfig {
    /// Per-step bounds handed to the engine.
    pub limits: StepLimits,
    /// Stop after this many iterations and report the proof incomplete.
    pub max_iterations: Option<usize>,
    /// Abort the run as soon as any node is discovered failing.
    pub fail_fast: bool,
}

/// How an exploration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploreStatus {
    /// No pending nodes remain.
    Complete,
    /// The iteration limit was reached with work outstanding.
    Incomplete,
    /// `fail_fast` stopped the run after a failing node appeared.
    Aborted,
}

/// Result of one exploration run.
#[derive(Debug, Clone)]
pub struct ExploreOutcome {
    /// How the run ended.
    pub status: ExploreStatus,
    /// Iterations consumed.
    pub iterations: u64,
}

/// Explores the proof until convergence or a limit.
///
/// Per iteration: pick a pending node, simplify it once, request one
/// bounded step, and fold the result back into the graph — an edge plus
/// successor for a plain advance, one successor per branch when the
/// engine split on a constraint, or a subsumption check against the
/// target when the engine reports the node stuck.
pub async fn explore(
    proof: &mut Proof,
    engine: &dyn Engine,
    store: &ProofStore,
    config: &ExploreConfig,
) -> Result<ExploreOutcome> {
    let started = Instant::now();
    let base_time = proof.exec_time;
    let mut iterations = 0u64;
    let mut simplified: BTreeSet<NodeId> = BTreeSet::new();

    tracing::info!(proof = %proof.id, pending = proof.pending().len(), "exploration start");

    let status = loop {
        if let Some(max) = config.max_iterations
            && iterations as usize >= max
        {
            tracing::warn!(proof = %proof.id, max, "iteration limit reached, proof left open");
            break ExploreStatus::Incomplete;
        }
        let Some(node_id) = proof.pending().first().copied() else {
            break ExploreStatus::Complete;
        };
        iterations += 1;

        // First visit: let the engine drop trivial conjuncts before any
        // stepping, writing the result back in place.
        if simplified.insert(node_id) {
            let state = proof.kcfg.node(node_id)?.cterm.clone();
            let simple = engine.simplify(&state).await?;
            if simple != state {
                proof.kcfg.let_node(node_id, simple)?;
            }
        }

        let state = proof.kcfg.node(node_id)?.cterm.clone();
        match engine.step(&state, &config.limits).await? {
            StepResult::Advance { state, depth } => {
                let successor = proof.kcfg.create_node(state);
                proof.kcfg.create_edge(node_id, successor, depth.max(1))?;
                tracing::debug!(proof = %proof.id, node = %node_id, %successor, depth, "advance");
            }
            StepResult::Branch { branches } => {
                let count = branches.len();
                for branch in branches {
                    let successor = proof.kcfg.create_node(branch);
                    proof.kcfg.create_edge(node_id, successor, 1)?;
                }
                tracing::debug!(proof = %proof.id, node = %node_id, count, "branch");
            }
            StepResult::Stuck => {
                let target_state = proof.kcfg.node(proof.target)?.cterm.clone();
                let implies = engine.implies(&state, &target_state).await?;
                if implies.holds {
                    proof.cover(node_id, proof.target)?;
                    tracing::debug!(proof = %proof.id, node = %node_id, "subsumed by target");
                } else {
                    proof.stuck.insert(node_id);
                    proof.failing.insert(node_id);
                    tracing::warn!(proof = %proof.id, node = %node_id, "failing node");
                    if config.fail_fast {
                        proof.update_status();
                        proof.iterations = iterations;
                        proof.exec_time = base_time + started.elapsed();
                        store.save(proof)?;
                        break ExploreStatus::Aborted;
                    }
                }
            }
        }

        proof.update_status();
        proof.iterations = iterations;
        proof.exec_time = base_time + started.elapsed();
        store.save(proof)?;
    };

    proof.update_status();
    proof.iterations = iterations;
    proof.exec_time = base_time + started.elapsed();
    store.save(proof)?;

    tracing::info!(proof = %proof.id, status = ?status, iterations, "exploration end");
    Ok(ExploreOutcome { status, iterations })
}

/// Re-derives the failing set for every stuck leaf with one implication
/// query each. The check is a live engine query because constraint
/// simplification between runs can change its outcome; verdicts are
/// never persisted.
pub async fn refresh_failing(proof: &mut Proof, engine: &dyn Engine) -> Result<Vec<NodeId>> {
    let target_state = proof.kcfg.node(proof.target)?.cterm.clone();
    for node_id in proof.stuck.clone() {
        if !proof.kcfg.contains(node_id) {
            proof.stuck.remove(&node_id);
            proof.failing.remove(&node_id);
            continue;
        }
        let state = proof.kcfg.node(node_id)?.cterm.clone();
        let holds = engine.implies(&state, &target_state).await?.holds;
        if holds {
            proof.failing.remove(&node_id);
        } else {
            proof.failing.insert(node_id);
        }
    }
    proof.update_status();
    Ok(proof.failing.iter().copied().collect())
}

/// Fetches concrete counterexample assignments for the given nodes.
pub async fn models(
    proof: &Proof,
    engine: &dyn Engine,
    nodes: &[NodeId],
) -> Result<Vec<(NodeId, Option<Subst>)>> {
    let mut out = Vec::with_capacity(nodes.len());
    for &node_id in nodes {
        let state = proof.kcfg.node(node_id)?.cterm.clone();
        let assignment = match engine.get_model(&state).await? {
            ModelResult::Model { assignment } => Some(assignment),
            ModelResult::Unsat | ModelResult::Unknown => None,
        };
        out.push((node_id, assignment));
    }
    Ok(out)
}
