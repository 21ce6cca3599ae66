//! Proof construction and batch orchestration
//!
//! Turns contract/method inputs into seeded proofs (including grafting
//! onto a completed setUp proof), resolves proof versions against the
//! digest file, and fans proof exploration out across a bounded worker
//! pool.

pub mod build;
pub mod calldata;
pub mod config;
pub mod contract;
pub mod resolver;
pub mod runner;

use athanor_core::ProofId;
use thiserror::Error;

pub use build::{seed_proof, BuildConfig, DeploymentState, StateAccess};
pub use calldata::LengthBounds;
pub use config::{ProveConfig, RunnerConfig};
pub use contract::{Contract, Manifest, Method};
pub use resolver::resolve_proof_version;
pub use runner::{plan, run_batch, BatchReport, Stage, TaskSpec, TestReport, WorkerReport};

/// Prove error type encompassing resolution, construction, and batch
/// orchestration failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Core graph or storage operation failed.
    #[error("core operation failed: {0}")]
    Core(#[from] athanor_core::Error),

    /// Engine call failed.
    #[error("engine operation failed: {0}")]
    Engine(#[from] athanor_engine::EngineError),

    /// Failed to read the contract manifest.
    #[error("could not read manifest '{path}': {source}")]
    ManifestRead {
        /// The path to the manifest file.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A dynamic argument has no resolvable length bound.
    #[error("no length bound for dynamic parameter `{parameter}` of `{method}`")]
    MissingLengthBound {
        /// The method being symbolized.
        method: String,
        /// The offending parameter.
        parameter: String,
    },

    /// A constructor was required but the contract declares none.
    #[error("contract `{0}` has no constructor")]
    MissingConstructor(String),

    /// Manifest parsing failed.
    #[error("manifest parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// The setup proof is not in a graftable state.
    #[error("setup proof {setup} is {status}, not passed with an empty frontier")]
    SetupNotPassed {
        /// The setup proof.
        setup: ProofId,
        /// Its observed status.
        status: String,
    },

    /// The setup proof branched and grafting is disabled.
    #[error("setup proof {setup} has {states} reachable final states and grafting is disabled")]
    UngraftableBranching {
        /// The setup proof.
        setup: ProofId,
        /// Number of reachable final states.
        states: usize,
    },

    /// The requested contract is not in the manifest.
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    /// The requested method is not on the contract.
    #[error("unknown method `{method}` on contract `{contract}`")]
    UnknownMethod {
        /// The contract searched.
        contract: String,
        /// The missing method.
        method: String,
    },

    /// An explicitly requested version has no on-disk proof.
    #[error("no proof on disk for {test} version {version}")]
    UnknownVersion {
        /// The qualified test name.
        test: String,
        /// The requested version.
        version: u32,
    },

    /// `--reinit` and an explicit version are mutually exclusive.
    #[error("--reinit cannot be combined with an explicit version")]
    VersionConflict,
}

/// Prove result type
pub type Result<T> = std::result::Result<T, Error>;
