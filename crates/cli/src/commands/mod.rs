use async_trait::async_trait;
use clap::Subcommand;
use std::error::Error;

pub mod merge;
pub mod model;
pub mod prove;
pub mod refute;
pub mod remove;
pub mod section;
pub mod show;
pub mod split;

use athanor_core::kcfg::NodeId;
use athanor_core::store::ProofStore;
use athanor_core::{Proof, ProofId};
use athanor_engine::client::{EngineConfig, RpcEngine};
use athanor_engine::Engine;
use athanor_ops::Operation;
use clap::Args;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Errors raised while executing CLI subcommands.
#[derive(Debug, ThisError)]
pub enum CliError {
    /// Core graph or storage operation failed.
    #[error("core error: {0}")]
    Core(#[from] athanor_core::Error),
    /// Engine call failed.
    #[error("engine error: {0}")]
    Engine(#[from] athanor_engine::EngineError),
    /// Graph mutation failed.
    #[error("operation error: {0}")]
    Ops(#[from] athanor_ops::Error),
    /// Resolution or batch orchestration failed.
    #[error("prove error: {0}")]
    Prove(#[from] athanor_prove::Error),
    /// At least one proof failed or errored.
    #[error("{0} proof(s) failed or errored")]
    ProofsFailed(usize),
}

/// CLI subcommands for Athanor.
#[derive(Subcommand)]
pub enum Cmd {
    /// Run proofs for a list of tests, resolving versions and staging
    /// setUp dependencies.
    Prove(prove::ProveArgs),
    /// Print a proof's graph shape, pending frontier, and failing nodes.
    Show(show::ShowArgs),
    /// Merge nodes into one generalized node via anti-unification.
    Merge(merge::MergeArgs),
    /// Case-split a pending node on an explicit boolean condition.
    Split(split::SplitArgs),
    /// Subdivide an edge into shorter edges through checkpoint nodes.
    Section(section::SectionArgs),
    /// Prune a node and everything reachable only through it.
    Remove(remove::RemoveArgs),
    /// Defer a pending node's obligation to a refutation subproof.
    Refute(refute::RefuteArgs),
    /// Restore a refuted node to the pending frontier.
    Unrefute(refute::UnrefuteArgs),
    /// Fetch concrete counterexample models for failing nodes.
    Model(model::ModelArgs),
}

/// Trait for executing CLI subcommands.
#[async_trait]
pub trait Command {
    /// Executes the subcommand.
    ///
    /// # Returns
    /// A `Result` indicating success or an error if execution fails.
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Prove(args) => args.execute().await,
            Cmd::Show(args) => args.execute().await,
            Cmd::Merge(args) => args.execute().await,
            Cmd::Split(args) => args.execute().await,
            Cmd::Section(args) => args.execute().await,
            Cmd::Remove(args) => args.execute().await,
            Cmd::Refute(args) => args.execute().await,
            Cmd::Unrefute(args) => args.execute().await,
            Cmd::Model(args) => args.execute().await,
        }
    }
}

/// Arguments shared by every command that opens a persisted proof.
#[derive(Args, Debug)]
pub struct ProofLocator {
    /// Proof identity, `Contract.method(args):version`.
    pub proof: String,
    /// Directory holding persisted proof records.
    #[arg(long, default_value = ".athanor/proofs")]
    pub proofs_dir: PathBuf,
    /// Rewrite-engine RPC endpoint.
    #[arg(long, default_value = "http://127.0.0.1:31425")]
    pub endpoint: String,
}

impl ProofLocator {
    /// Opens the store and loads the proof.
    pub fn open(&self) -> Result<(ProofStore, Proof), CliError> {
        let id = ProofId::parse(&self.proof)?;
        let store = ProofStore::new(&self.proofs_dir);
        let proof = store.load(&id)?;
        Ok((store, proof))
    }

    /// Builds an engine client for the configured endpoint.
    pub fn engine(&self) -> Result<RpcEngine, CliError> {
        Ok(RpcEngine::new(EngineConfig::new(&self.endpoint))?)
    }
}

/// Applies one mutation to a persisted proof, re-persisting the whole
/// record (and any detached subproof) only on success.
pub async fn apply_operation(
    locator: &ProofLocator,
    operation: &dyn Operation,
) -> Result<(), Box<dyn Error>> {
    let (store, mut proof) = locator.open()?;
    let engine = locator.engine()?;
    let outcome = operation
        .apply(&mut proof, &engine as &dyn Engine)
        .await
        .map_err(CliError::Ops)?;
    if let Some((_, subproof)) = &outcome.subproof {
        store.save(subproof).map_err(CliError::Core)?;
    }
    store.save(&proof).map_err(CliError::Core)?;

    if !outcome.created.is_empty() {
        println!("created nodes: {}", display_nodes(&outcome.created));
    }
    if !outcome.removed.is_empty() {
        println!("removed nodes: {}", display_nodes(&outcome.removed));
    }
    if let Some((subproof_id, _)) = &outcome.subproof {
        println!("subproof: {subproof_id}");
    }
    println!("{}", proof.summary());
    Ok(())
}

fn display_nodes(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(NodeId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
