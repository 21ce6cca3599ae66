//! Module for the `show` subcommand, which prints a proof's shape.

use crate::commands::{CliError, ProofLocator};
use async_trait::async_trait;
use athanor_core::kcfg::KEdge;
use athanor_engine::explore::refresh_failing;
use athanor_engine::Engine;
use clap::Args;
use std::collections::BTreeSet;
use std::error::Error;

/// Arguments for the `show` subcommand.
#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// Collapse interior bookkeeping nodes before printing.
    #[arg(long)]
    pub minimize: bool,
    /// Re-derive the failing set with live implication queries.
    #[arg(long)]
    pub refresh_failing: bool,
}

/// Executes the `show` subcommand.
#[async_trait]
impl super::Command for ShowArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let (store, mut proof) = self.locator.open()?;

        if self.refresh_failing {
            let engine = self.locator.engine()?;
            refresh_failing(&mut proof, &engine as &dyn Engine)
                .await
                .map_err(CliError::Engine)?;
            store.save(&proof).map_err(CliError::Core)?;
        }

        if self.minimize {
            let mut protected = BTreeSet::from([proof.init, proof.target]);
            protected.extend(proof.stuck.iter().copied());
            protected.extend(proof.refutations.keys().copied());
            let removed = proof.kcfg.minimize(&protected);
            if !removed.is_empty() {
                println!("minimized away {} nodes", removed.len());
            }
        }

        println!("{}", proof.summary());
        println!("init: {}  target: {}", proof.init, proof.target);

        for node_id in proof.kcfg.node_ids() {
            let node = proof.kcfg.node(node_id).map_err(CliError::Core)?;
            let mut tags: Vec<&str> = Vec::new();
            if node_id == proof.init {
                tags.push("init");
            }
            if node_id == proof.target {
                tags.push("target");
            }
            if proof.failing.contains(&node_id) {
                tags.push("failing");
            } else if proof.stuck.contains(&node_id) {
                tags.push("stuck");
            }
            if proof.refutations.contains_key(&node_id) {
                tags.push("refuted");
            }
            if proof.is_pending(node_id) {
                tags.push("pending");
            }
            let tags = if tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", tags.join(", "))
            };
            println!(
                "node {}{tags}: {} constraints",
                node_id,
                node.cterm.constraints().len()
            );
            for (target, edge) in proof.kcfg.out_edges(node_id) {
                match edge {
                    KEdge::Step { depth } => println!("  --{depth}--> {target}"),
                    KEdge::Cover => println!("  ~~cover~~> {target}"),
                    KEdge::Split => println!("  ==split==> {target}"),
                }
            }
        }

        if !proof.refutations.is_empty() {
            println!("refutations:");
            for (node, subproof) in &proof.refutations {
                println!("  node {node} -> {subproof}");
            }
        }
        Ok(())
    }
}
