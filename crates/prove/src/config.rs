//! Run configuration
//!
//! One flat struct per concern, composed explicitly into a top-level
//! value the CLI resolves once at startup and passes by reference into
//! the core. Nothing here is read from globals.

use crate::build::BuildConfig;
use athanor_engine::explore::ExploreConfig;

/// Top-level configuration for a prove run.
#[derive(Debug, Clone, Default)]
pub struct ProveConfig {
    /// State-construction flags.
    pub build: BuildConfig,
    /// Exploration limits and rule sets.
    pub explore: ExploreConfig,
    /// Worker-pool and endpoint settings.
    pub runner: RunnerConfig,
    /// Force fresh construction under a new version.
    pub reinit: bool,
    /// Explicit version to open instead of resolving one.
    pub version: Option<u32>,
}

/// Worker-pool settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum proofs explored concurrently.
    pub workers: usize,
    /// Engine endpoints; workers are assigned round-robin. A single
    /// entry shares one engine server across all workers, trading
    /// isolation for resource savings.
    pub endpoints: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            endpoints: vec!["http://127.0.0.1:31425".to_string()],
        }
    }
}
