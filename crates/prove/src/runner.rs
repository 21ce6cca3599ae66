//! Batch proof orchestration
//!
//! Turns an unordered set of requested tests into a dependency-respecting
//! plan — constructors, then one setUp per touched contract, then the
//! tests — and drives each stage across a bounded worker pool. Workers
//! are fully independent: each owns an engine connection and its own
//! proofs, and reports a tagged result the orchestrator folds into the
//! batch. The only cross-worker coordination is the stage barrier.

use crate::build::seed_proof;
use crate::config::ProveConfig;
use crate::contract::{Contract, Manifest, Method};
use crate::resolver::resolve_proof_version;
use crate::{Error, Result};
use athanor_core::digest::DigestFile;
use athanor_core::store::ProofStore;
use athanor_core::{Proof, ProofId, ProofStatus};
use athanor_engine::explore::{explore, ExploreOutcome, ExploreStatus};
use athanor_engine::pool::EnginePool;
use athanor_engine::Engine;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// One requested unit of proof work.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskSpec {
    /// Contract name.
    pub contract: String,
    /// Method name or signature.
    pub method: String,
}

/// A dependency stage of the execution plan. Every stage must fully
/// pass before the next one starts.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Stage label for logging.
    pub label: &'static str,
    /// Work in this stage, deduplicated.
    pub tasks: Vec<TaskSpec>,
}

/// Computes the staged execution plan for the requested tests. Returns
/// the stages plus the requests rejected during resolution (unknown
/// contract or method, constructor required but absent); rejections
/// fail only the request they name.
pub fn plan(
    manifest: &Manifest,
    requests: &[String],
    run_constructor: bool,
) -> (Vec<Stage>, Vec<(String, String)>) {
    let mut rejected: Vec<(String, String)> = Vec::new();
    let mut tests: BTreeSet<TaskSpec> = BTreeSet::new();

    for request in requests {
        let Some((contract_name, method_name)) = request.split_once('.') else {
            rejected.push((
                request.clone(),
                "expected `Contract.method` test identifier".to_string(),
            ));
            continue;
        };
        let contract = match manifest.contract(contract_name) {
            Ok(contract) => contract,
            Err(err) => {
                rejected.push((request.clone(), err.to_string()));
                continue;
            }
        };
        if let Err(err) = contract.method(method_name) {
            rejected.push((request.clone(), err.to_string()));
            continue;
        }
        if run_constructor && contract.constructor.is_none() {
            rejected.push((
                request.clone(),
                Error::MissingConstructor(contract.name.clone()).to_string(),
            ));
            continue;
        }
        tests.insert(TaskSpec {
            contract: contract_name.to_string(),
            method: method_name.to_string(),
        });
    }

    let touched: BTreeSet<&str> = tests.iter().map(|task| task.contract.as_str()).collect();
    let mut stages = Vec::new();

    if run_constructor {
        let constructors: Vec<TaskSpec> = touched
            .iter()
            .filter(|name| {
                manifest
                    .contract(name)
                    .is_ok_and(|contract| contract.constructor.is_some())
            })
            .map(|name| TaskSpec {
                contract: name.to_string(),
                method: "constructor".to_string(),
            })
            .collect();
        if !constructors.is_empty() {
            stages.push(Stage {
                label: "constructors",
                tasks: constructors,
            });
        }
    }

    let setups: Vec<TaskSpec> = touched
        .iter()
        .filter(|name| {
            manifest
                .contract(name)
                .is_ok_and(|contract| contract.setup_method().is_some())
        })
        .map(|name| TaskSpec {
            contract: name.to_string(),
            method: "setUp".to_string(),
        })
        .collect();
    if !setups.is_empty() {
        stages.push(Stage {
            label: "setUp",
            tasks: setups,
        });
    }

    stages.push(Stage {
        label: "tests",
        tasks: tests.into_iter().collect(),
    });
    (stages, rejected)
}

/// Per-proof outcome detail.
#[derive(Debug, Clone)]
pub struct TestReport {
    /// The proof explored.
    pub id: ProofId,
    /// Final proof status.
    pub status: ProofStatus,
    /// Whether the run hit its iteration limit with work outstanding.
    pub incomplete: bool,
    /// Worker wall-clock time for this proof.
    pub duration: Duration,
    /// Node count of the final graph.
    pub nodes: usize,
    /// Pending frontier size at the end of the run.
    pub pending: usize,
    /// Failing node count.
    pub failing: usize,
}

/// Tagged result one worker hands back to the orchestrator.
#[derive(Debug, Clone)]
pub enum WorkerReport {
    /// The proof passed.
    Passed(TestReport),
    /// The proof has failing nodes.
    Failed(TestReport),
    /// The run stopped at a resource limit with the proof still open.
    Incomplete(TestReport),
    /// The worker could not produce a proof result at all.
    Errored {
        /// Qualified test name.
        test: String,
        /// Contract the test belongs to.
        contract: String,
        /// What went wrong.
        reason: String,
    },
}

impl WorkerReport {
    /// Contract this report belongs to.
    pub fn contract(&self) -> &str {
        match self {
            WorkerReport::Passed(report)
            | WorkerReport::Failed(report)
            | WorkerReport::Incomplete(report) => &report.id.contract,
            WorkerReport::Errored { contract, .. } => contract,
        }
    }

    /// Qualified test name this report belongs to.
    pub fn test_name(&self) -> String {
        match self {
            WorkerReport::Passed(report)
            | WorkerReport::Failed(report)
            | WorkerReport::Incomplete(report) => report.id.test_name(),
            WorkerReport::Errored { test, .. } => test.clone(),
        }
    }

    /// True for failed or errored outcomes.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            WorkerReport::Failed(_) | WorkerReport::Errored { .. }
        )
    }
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One report per requested proof, in completion order.
    pub reports: Vec<WorkerReport>,
    /// Contracts whose constructor or setUp failed, aborting their
    /// dependent tests.
    pub setup_failures: Vec<String>,
}

impl BatchReport {
    /// True when every proof passed and nothing errored.
    pub fn all_passed(&self) -> bool {
        self.setup_failures.is_empty()
            && self.reports.iter().all(|report| matches!(report, WorkerReport::Passed(_)))
    }
}

struct WorkerInput {
    id: ProofId,
    contract: Contract,
    method: Method,
    graft_onto: Option<ProofId>,
    engine: Arc<dyn Engine>,
    store: ProofStore,
    config: ProveConfig,
}

/// Runs the requested tests to completion across the worker pool.
///
/// The digest file is read once up front (single-threaded, before any
/// fan-out) and the entries of each stage are recorded and persisted
/// before that stage starts exploring, so a crash mid-proof cannot
/// leave a stale-looking digest behind.
pub async fn run_batch(
    manifest: &Manifest,
    requests: &[String],
    config: &ProveConfig,
    pool: &EnginePool,
    store: &ProofStore,
    digest_path: &Path,
) -> Result<BatchReport> {
    let mut digests = DigestFile::load(digest_path)?;
    let (stages, rejected) = plan(manifest, requests, config.build.run_constructor);

    let mut report = BatchReport::default();
    for (request, reason) in rejected {
        let contract = request
            .split_once('.')
            .map(|(c, _)| c)
            .unwrap_or_default()
            .to_string();
        tracing::error!(%request, %reason, "request rejected");
        report.reports.push(WorkerReport::Errored {
            test: request,
            contract,
            reason,
        });
    }

    let mut failed_contracts: BTreeSet<String> = BTreeSet::new();
    // Resolved ids of this run's constructor and setUp proofs, for
    // downstream grafting.
    let mut stage_ids: HashMap<(String, &'static str), ProofId> = HashMap::new();
    let mut endpoint_cursor = 0usize;

    for stage in stages {
        let mut inputs: Vec<WorkerInput> = Vec::new();
        for task in &stage.tasks {
            if failed_contracts.contains(&task.contract) {
                report.reports.push(WorkerReport::Errored {
                    test: format!("{}.{}", task.contract, task.method),
                    contract: task.contract.clone(),
                    reason: "aborted: constructor or setUp failed for this contract".to_string(),
                });
                continue;
            }
            match prepare_task(
                task,
                stage.label,
                manifest,
                config,
                pool,
                store,
                &mut digests,
                &stage_ids,
                &mut endpoint_cursor,
            ) {
                Ok(input) => {
                    stage_ids.insert((task.contract.clone(), stage.label), input.id.clone());
                    inputs.push(input);
                }
                Err(err) => {
                    report.reports.push(WorkerReport::Errored {
                        test: format!("{}.{}", task.contract, task.method),
                        contract: task.contract.clone(),
                        reason: err.to_string(),
                    });
                    if stage.label != "tests" {
                        failed_contracts.insert(task.contract.clone());
                    }
                }
            }
        }
        // Record the stage's digests before exploration starts.
        digests.save()?;

        let stage_reports = run_stage(inputs, config.runner.workers, config.explore.fail_fast).await;
        for worker_report in stage_reports {
            if stage.label != "tests" && worker_report.is_failure() {
                failed_contracts.insert(worker_report.contract().to_string());
            }
            log_report(&worker_report);
            report.reports.push(worker_report);
        }
    }

    report.setup_failures = failed_contracts.into_iter().collect();
    if !report.setup_failures.is_empty() {
        tracing::error!(
            contracts = ?report.setup_failures,
            "constructor or setUp failures aborted dependent tests"
        );
    }
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn prepare_task(
    task: &TaskSpec,
    stage_label: &'static str,
    manifest: &Manifest,
    config: &ProveConfig,
    pool: &EnginePool,
    store: &ProofStore,
    digests: &mut DigestFile,
    stage_ids: &HashMap<(String, &'static str), ProofId>,
    endpoint_cursor: &mut usize,
) -> Result<WorkerInput> {
    let contract = manifest.contract(&task.contract)?;
    let method = if task.method == "constructor" {
        contract
            .constructor
            .as_ref()
            .ok_or_else(|| Error::MissingConstructor(contract.name.clone()))?
    } else {
        contract.method(&task.method)?
    };

    // Explicit versions only make sense for a single directly requested
    // test; dependency stages always resolve their own.
    let requested = if stage_label == "tests" { config.version } else { None };
    let version = resolve_proof_version(store, digests, contract, method, config.reinit, requested)?;
    let id = ProofId::new(&contract.name, method.signature(), version);

    let test = format!("{}.{}", contract.name, method.signature());
    digests.update(test, contract.digest_entry(method));

    let graft_onto = match stage_label {
        "tests" => stage_ids.get(&(task.contract.clone(), "setUp")).cloned(),
        "setUp" => stage_ids.get(&(task.contract.clone(), "constructors")).cloned(),
        _ => None,
    };

    let endpoints = &config.runner.endpoints;
    let endpoint = &endpoints[*endpoint_cursor % endpoints.len()];
    *endpoint_cursor += 1;
    let engine: Arc<dyn Engine> = pool.checkout(endpoint)?;

    Ok(WorkerInput {
        id,
        contract: contract.clone(),
        method: method.clone(),
        graft_onto,
        engine,
        store: store.clone(),
        config: config.clone(),
    })
}

/// Fans a stage's tasks across at most `workers` concurrent workers and
/// collects their tagged reports. With `fail_fast`, a failing report
/// stops further work from being issued; in-flight proofs complete.
async fn run_stage(inputs: Vec<WorkerInput>, workers: usize, fail_fast: bool) -> Vec<WorkerReport> {
    let mut reports = Vec::with_capacity(inputs.len());
    let mut queue = inputs.into_iter();
    let mut join_set: JoinSet<WorkerReport> = JoinSet::new();

    for input in queue.by_ref().take(workers.max(1)) {
        join_set.spawn(run_worker(input));
    }

    let mut stop_issuing = false;
    while let Some(joined) = join_set.join_next().await {
        let worker_report = joined.unwrap_or_else(|join_err| WorkerReport::Errored {
            test: String::new(),
            contract: String::new(),
            reason: format!("worker task failed: {join_err}"),
        });
        if fail_fast && worker_report.is_failure() {
            stop_issuing = true;
        }
        reports.push(worker_report);

        if !stop_issuing
            && let Some(input) = queue.next()
        {
            join_set.spawn(run_worker(input));
        }
    }

    for skipped in queue {
        reports.push(WorkerReport::Errored {
            test: skipped.id.test_name(),
            contract: skipped.id.contract.clone(),
            reason: "skipped after failure (fail-fast)".to_string(),
        });
    }
    reports
}

/// One worker: build or resume the proof, explore it, classify the
/// result. Errors are captured into the report instead of crossing the
/// task boundary.
async fn run_worker(input: WorkerInput) -> WorkerReport {
    let started = Instant::now();
    match prove_task(&input).await {
        Ok((proof, outcome)) => {
            let report = TestReport {
                id: proof.id.clone(),
                status: proof.status,
                incomplete: outcome.status == ExploreStatus::Incomplete,
                duration: started.elapsed(),
                nodes: proof.kcfg.node_count(),
                pending: proof.pending().len(),
                failing: proof.failing.len(),
            };
            match proof.status {
                ProofStatus::Failed => WorkerReport::Failed(report),
                ProofStatus::Passed => WorkerReport::Passed(report),
                ProofStatus::Pending => WorkerReport::Incomplete(report),
            }
        }
        Err(err) => WorkerReport::Errored {
            test: input.id.test_name(),
            contract: input.id.contract.clone(),
            reason: err.to_string(),
        },
    }
}

async fn prove_task(input: &WorkerInput) -> Result<(Proof, ExploreOutcome)> {
    let mut proof = if input.store.contains(&input.id) {
        tracing::info!(proof = %input.id, "resuming persisted proof");
        input.store.load(&input.id)?
    } else {
        let setup = match &input.graft_onto {
            Some(setup_id) => Some(input.store.load(setup_id)?),
            None => None,
        };
        seed_proof(
            input.id.clone(),
            &input.contract,
            &input.method,
            setup.as_ref(),
            &input.config.build,
        )?
    };
    let outcome = explore(
        &mut proof,
        input.engine.as_ref(),
        &input.store,
        &input.config.explore,
    )
    .await?;
    Ok((proof, outcome))
}

/// One line per finished proof, the batch's user-visible summary.
fn log_report(report: &WorkerReport) {
    match report {
        WorkerReport::Passed(detail) => tracing::info!(
            test = %detail.id,
            time = ?detail.duration,
            nodes = detail.nodes,
            "PASSED"
        ),
        WorkerReport::Failed(detail) => tracing::error!(
            test = %detail.id,
            time = ?detail.duration,
            failing = detail.failing,
            "FAILED"
        ),
        WorkerReport::Incomplete(detail) => tracing::warn!(
            test = %detail.id,
            time = ?detail.duration,
            pending = detail.pending,
            "INCOMPLETE"
        ),
        WorkerReport::Errored { test, reason, .. } => {
            tracing::error!(%test, %reason, "ERRORED");
        }
    }
}
