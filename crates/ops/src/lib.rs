//! Interactive proof-graph mutation operations
//!
//! After a proof run, the graph can be refined by hand: merging sibling
//! branches, case-splitting a node on an explicit condition, sectioning
//! an opaque multi-step edge into inspectable checkpoints, pruning a
//! subtree, or deferring a branch's obligation to a refutation subproof.
//! Every operation validates before it mutates; a failed operation
//! leaves the proof untouched.

pub mod merge;
pub mod refute;
pub mod remove;
pub mod section;
pub mod split;

use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_core::{Proof, ProofId};
use athanor_engine::Engine;
use thiserror::Error;

pub use merge::MergeNodes;
pub use refute::{RefuteNode, UnrefuteNode};
pub use remove::RemoveNode;
pub use section::SectionEdge;
pub use split::SplitNode;

/// Operation error type encompassing all mutation failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Core graph operation failed.
    #[error("graph operation failed: {0}")]
    Core(#[from] athanor_core::Error),

    /// Engine call failed while re-exploring an edge.
    #[error("engine operation failed: {0}")]
    Engine(#[from] athanor_engine::EngineError),

    /// The section count does not fit the edge's depth.
    #[error("cannot section an edge of depth {depth} into {sections} parts")]
    InvalidSectionCount {
        /// Requested section count.
        sections: usize,
        /// Depth of the targeted edge.
        depth: usize,
    },

    /// The node has no path constraint left to refute.
    #[error("node {0} has no path constraint to refute")]
    NothingToRefute(NodeId),

    /// The targeted node is not on the frontier.
    #[error("node {0} is not pending")]
    NotPending(NodeId),

    /// Re-running an edge produced a different shape than the original.
    #[error("sectioning diverged from the recorded edge: {0}")]
    SectionDiverged(String),

    /// Merge candidates execute different code paths.
    #[error("nodes differ in structural cells: {}", cells.join(", "))]
    StructuralMismatch {
        /// The cells that disagree.
        cells: Vec<String>,
    },

    /// Too few nodes were supplied.
    #[error("operation needs at least {needed} nodes, got {got}")]
    TooFewNodes {
        /// Minimum required.
        needed: usize,
        /// Actually supplied.
        got: usize,
    },

    /// The predicate references a variable the node does not bind.
    #[error("unknown variable in split condition: {0}")]
    UnknownVariable(String),
}

/// Operation result type
pub type Result<T> = std::result::Result<T, Error>;

/// What an operation changed.
#[derive(Debug, Clone, Default)]
pub struct OpOutcome {
    /// Nodes the operation created.
    pub created: Vec<NodeId>,
    /// Nodes the operation removed.
    pub removed: Vec<NodeId>,
    /// A detached subproof the caller must persist, with its id.
    pub subproof: Option<(ProofId, Proof)>,
}

/// Trait for proof-graph mutations.
///
/// Mutations are atomic from the caller's point of view: `apply` either
/// transforms the proof completely or returns an error with the proof
/// unchanged. The engine handle is only exercised by operations that
/// re-run execution (sectioning) — the rest ignore it.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Returns the operation's name for logging and identification.
    fn name(&self) -> &'static str;

    /// Applies the operation to the proof.
    async fn apply(&self, proof: &mut Proof, engine: &dyn Engine) -> Result<OpOutcome>;
}
