//! Module for the `prove` subcommand, which runs a batch of proofs.
//!
//! Tests are resolved against the manifest, versions are assigned from
//! the digest file, and the staged plan (constructors, setUp methods,
//! then the tests) is fanned out across the worker pool.

use crate::commands::CliError;
use async_trait::async_trait;
use athanor_core::store::ProofStore;
use athanor_engine::pool::EnginePool;
use athanor_engine::protocol::StepLimits;
use athanor_prove::build::DeploymentState;
use athanor_prove::config::RunnerConfig;
use athanor_prove::{run_batch, BuildConfig, Manifest, ProveConfig, WorkerReport};
use clap::Args;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the `prove` subcommand.
#[derive(Args)]
pub struct ProveArgs {
    /// Path to the contract manifest JSON.
    pub manifest: PathBuf,
    /// Tests to prove, as `Contract.method` identifiers.
    #[arg(required = true)]
    pub tests: Vec<String>,
    /// Force fresh proof construction under a new version.
    #[arg(long)]
    pub reinit: bool,
    /// Open this specific version instead of resolving one.
    #[arg(long)]
    pub version: Option<u32>,
    /// Maximum proofs explored concurrently.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,
    /// Engine endpoints; repeat for per-worker servers, pass once to
    /// share one server across all workers.
    #[arg(long = "endpoint", default_value = "http://127.0.0.1:31425")]
    pub endpoints: Vec<String>,
    /// Engine transport timeout in seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
    /// Maximum rewrite depth per execution step.
    #[arg(long, default_value_t = 1000)]
    pub max_depth: usize,
    /// Stop exploring a proof after this many iterations.
    #[arg(long)]
    pub max_iterations: Option<usize>,
    /// Rule labels that stop execution when entered.
    #[arg(long = "cut-point-rule")]
    pub cut_point_rules: Vec<String>,
    /// Rule labels that mark a state as final.
    #[arg(long = "terminal-rule")]
    pub terminal_rules: Vec<String>,
    /// Abort work on the first failing node.
    #[arg(long)]
    pub fail_fast: bool,
    /// Track gas symbolically.
    #[arg(long)]
    pub use_gas: bool,
    /// Make the test contract's storage symbolic.
    #[arg(long)]
    pub symbolic_state: bool,
    /// Run contract constructors before setUp methods.
    #[arg(long)]
    pub run_constructor: bool,
    /// Allow grafting onto a setup proof with multiple final states.
    #[arg(long)]
    pub graft: bool,
    /// Exact length for a dynamic parameter, as `name=length`; repeatable.
    #[arg(long = "length")]
    pub lengths: Vec<String>,
    /// Recorded deployment state JSON to merge into initial accounts.
    #[arg(long)]
    pub deployment_state: Option<PathBuf>,
    /// Directory holding persisted proof records.
    #[arg(long, default_value = ".athanor/proofs")]
    pub proofs_dir: PathBuf,
    /// Path of the persisted digest file.
    #[arg(long, default_value = ".athanor/digest.json")]
    pub digest_file: PathBuf,
}

/// Executes the `prove` subcommand.
#[async_trait]
impl super::Command for ProveArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let manifest = Manifest::load(&self.manifest).map_err(CliError::Prove)?;

        let mut lengths = athanor_prove::LengthBounds::new();
        for entry in &self.lengths {
            let Some((name, length)) = entry.split_once('=') else {
                return Err(format!("invalid --length `{entry}`, expected name=length").into());
            };
            let length: usize = length
                .parse()
                .map_err(|_| format!("invalid --length value in `{entry}`"))?;
            lengths.insert(name.to_string(), length);
        }

        let deployment_state: Option<DeploymentState> = match &self.deployment_state {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|err| format!("could not read {}: {err}", path.display()))?;
                Some(serde_json::from_str(&text)?)
            }
            None => None,
        };

        let config = ProveConfig {
            build: BuildConfig {
                use_gas: self.use_gas,
                symbolic_state: self.symbolic_state,
                run_constructor: self.run_constructor,
                graft: self.graft,
                lengths,
                deployment_state,
            },
            explore: athanor_engine::explore::ExploreConfig {
                limits: StepLimits {
                    max_depth: self.max_depth,
                    cut_point_rules: self.cut_point_rules.clone(),
                    terminal_rules: self.terminal_rules.clone(),
                },
                max_iterations: self.max_iterations,
                fail_fast: self.fail_fast,
            },
            runner: RunnerConfig {
                workers: self.workers,
                endpoints: self.endpoints.clone(),
            },
            reinit: self.reinit,
            version: self.version,
        };

        let pool = EnginePool::new(Duration::from_secs(self.timeout));
        let store = ProofStore::new(&self.proofs_dir);
        let report = run_batch(
            &manifest,
            &self.tests,
            &config,
            &pool,
            &store,
            &self.digest_file,
        )
        .await
        .map_err(CliError::Prove)?;

        let mut failures = 0usize;
        for worker_report in &report.reports {
            match worker_report {
                WorkerReport::Passed(detail) => {
                    println!("PASSED      {} ({:.1?})", detail.id, detail.duration);
                }
                WorkerReport::Incomplete(detail) => {
                    println!(
                        "INCOMPLETE  {} ({:.1?}, {} pending)",
                        detail.id, detail.duration, detail.pending
                    );
                }
                WorkerReport::Failed(detail) => {
                    failures += 1;
                    println!(
                        "FAILED      {} ({:.1?}, {} failing)",
                        detail.id, detail.duration, detail.failing
                    );
                }
                WorkerReport::Errored { test, reason, .. } => {
                    failures += 1;
                    println!("ERRORED     {test}: {reason}");
                }
            }
        }
        if !report.setup_failures.is_empty() {
            println!(
                "setup failures aborted dependent tests in: {}",
                report.setup_failures.join(", ")
            );
        }

        if report.all_passed() {
            Ok(())
        } else {
            Err(Box::new(CliError::ProofsFailed(failures.max(1))))
        }
    }
}
