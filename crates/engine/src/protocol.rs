//! Wire types for the rewrite-engine RPC protocol
//!
//! Requests ride a JSON-RPC 2.0 envelope; configurations and constraints
//! cross the boundary as the core's serde representation and stay opaque
//! on this side of it.

use athanor_core::{CTerm, Subst};
use serde::{Deserialize, Serialize};

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<P> {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Request id, unique per connection.
    pub id: u64,
    /// Method name.
    pub method: &'static str,
    /// Method parameters.
    pub params: P,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcResponse<R> {
    /// Result payload when the call succeeded.
    pub result: Option<R>,
    /// Error object when the call failed.
    pub error: Option<RpcErrorObject>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    /// Engine-defined error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured context, e.g. the offending term.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Bounds on a single step request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepLimits {
    /// Maximum rewrite depth for one step.
    pub max_depth: usize,
    /// Rule labels that stop execution when entered (calls, jumps,
    /// storage accesses).
    pub cut_point_rules: Vec<String>,
    /// Rule labels that mark a state as final.
    pub terminal_rules: Vec<String>,
}

impl Default for StepLimits {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            cut_point_rules: Vec::new(),
            terminal_rules: Vec::new(),
        }
    }
}

/// Parameters for `execute`.
#[derive(Debug, Serialize)]
pub struct StepParams<'a> {
    /// The state to advance.
    pub state: &'a CTerm,
    /// Step bounds and rule sets.
    #[serde(flatten)]
    pub limits: &'a StepLimits,
}

/// Engine answer to a step request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum StepResult {
    /// One successor, no branching.
    Advance {
        /// Successor state.
        state: CTerm,
        /// Rewrite steps actually taken.
        depth: usize,
    },
    /// The engine branched on a constraint.
    Branch {
        /// One successor state per branch, each carrying the branch
        /// condition in its constraint set.
        branches: Vec<CTerm>,
    },
    /// No further rule applies.
    Stuck,
}

/// Parameters for `simplify`.
#[derive(Debug, Serialize)]
pub struct SimplifyParams<'a> {
    /// The state to simplify.
    pub state: &'a CTerm,
}

/// Result of `simplify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifyResult {
    /// Simplified state with trivial conjuncts removed.
    pub state: CTerm,
}

/// Parameters for `implies`.
#[derive(Debug, Serialize)]
pub struct ImpliesParams<'a> {
    /// The state assumed to hold.
    pub antecedent: &'a CTerm,
    /// The state to establish.
    pub consequent: &'a CTerm,
}

/// Result of `implies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpliesResult {
    /// Whether the implication holds.
    pub holds: bool,
    /// Witnessing substitution when it does.
    #[serde(default)]
    pub substitution: Option<Subst>,
}

/// Parameters for `get-model`.
#[derive(Debug, Serialize)]
pub struct GetModelParams<'a> {
    /// The state to find an assignment for.
    pub state: &'a CTerm,
}

/// Result of `get-model`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ModelResult {
    /// A concrete variable assignment satisfying the constraints.
    Model {
        /// Variable name to concrete value.
        assignment: Subst,
    },
    /// The constraints are unsatisfiable.
    Unsat,
    /// The solver could not decide.
    Unknown,
}
