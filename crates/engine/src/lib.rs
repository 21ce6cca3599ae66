//! Rewrite-engine boundary and exploration driver
//!
//! The symbolic-execution engine is an external JSON-RPC service. This
//! crate owns the request/response protocol, the HTTP client, the
//! endpoint-keyed connection pool, and the exploration loop that drives
//! a proof's frontier through the engine until convergence.

pub mod client;
pub mod explore;
pub mod pool;
pub mod protocol;

use async_trait::async_trait;
use athanor_core::CTerm;
use protocol::{ImpliesResult, ModelResult, StepLimits, StepResult};
use thiserror::Error;

/// Engine error type encompassing all engine module errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Core graph operation failed while applying an engine result.
    #[error("graph operation failed: {0}")]
    Core(#[from] athanor_core::Error),

    /// The engine answered outside the protocol.
    #[error("invalid engine response: {0}")]
    InvalidResponse(String),

    /// The engine reported a request-level failure.
    #[error("engine rejected request `{method}` (code {code}): {message}")]
    Rpc {
        /// The RPC method that failed.
        method: String,
        /// Engine-reported error code.
        code: i64,
        /// Engine-reported message, including the offending term when
        /// the engine identifies one.
        message: String,
    },

    /// The transport to the engine failed.
    #[error("engine transport failure against {endpoint}: {reason}")]
    Transport {
        /// The endpoint the request was sent to.
        endpoint: String,
        /// Underlying transport error description.
        reason: String,
    },
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

/// The four requests the core issues against the external engine.
///
/// Implemented by [`client::RpcEngine`] for the real service and by mock
/// engines in tests, so the driver and the mutation operations can be
/// exercised without a server.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Requests one bounded execution step from the given state.
    async fn step(&self, state: &CTerm, limits: &StepLimits) -> Result<StepResult>;

    /// Requests a simplified configuration with trivial conjuncts removed.
    async fn simplify(&self, state: &CTerm) -> Result<CTerm>;

    /// Asks whether the antecedent state implies the consequent state.
    async fn implies(&self, antecedent: &CTerm, consequent: &CTerm) -> Result<ImpliesResult>;

    /// Requests a concrete variable assignment for the state.
    async fn get_model(&self, state: &CTerm) -> Result<ModelResult>;
}
