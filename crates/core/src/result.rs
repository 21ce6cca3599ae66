//! Core results and error types

use crate::kcfg::NodeId;
use thiserror::Error;

/// Core error type encompassing all core module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A node already carries an outgoing edge or cover.
    #[error("node {0} already has a terminal disposition")]
    AlreadyTerminal(NodeId),

    /// A cover was requested for a node that is refuted.
    #[error("node {0} is refuted and cannot be covered")]
    CoveredWhileRefuted(NodeId),

    /// Failed to read the digest file.
    #[error("could not read digest file '{path}': {source}")]
    DigestRead {
        /// The path to the digest file.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the digest file.
    #[error("could not write digest file '{path}': {source}")]
    DigestWrite {
        /// The path to the digest file.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// No edge connects the given pair of nodes.
    #[error("no step edge from node {src} to node {target}")]
    EdgeMissing {
        /// The source node of the missing edge.
        src: NodeId,
        /// The target node of the missing edge.
        target: NodeId,
    },

    /// An edge was created with a zero step depth.
    #[error("edge depth must be at least 1, got {0}")]
    InvalidDepth(usize),

    /// A proof identity string could not be parsed.
    #[error("invalid proof id: {0}")]
    InvalidProofId(String),

    /// The referenced node does not exist in the graph.
    #[error("no such node: {0}")]
    NodeMissing(NodeId),

    /// The node is not refuted, so it cannot be unrefuted.
    #[error("node {0} is not refuted")]
    NotRefuted(NodeId),

    /// Failed to parse a boolean predicate.
    #[error("predicate parse error at offset {offset}: {msg}")]
    PredicateParse {
        /// Byte offset into the predicate text where parsing failed.
        offset: usize,
        /// Description of the parsing error.
        msg: String,
    },

    /// Failed to read a persisted proof record.
    #[error("could not read proof record '{path}': {source}")]
    ProofRead {
        /// The path to the proof record.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a persisted proof record.
    #[error("could not write proof record '{path}': {source}")]
    ProofWrite {
        /// The path to the proof record.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A proof operation targeted the init or target node.
    #[error("node {0} is the {1} node and cannot be modified")]
    ProtectedNode(NodeId, &'static str),

    /// Proof record serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No proof record exists for the requested identity.
    #[error("unknown proof: {0}")]
    UnknownProof(String),
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
