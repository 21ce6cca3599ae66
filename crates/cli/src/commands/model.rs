//! Module for the `model` subcommand, which fetches concrete
//! counterexample assignments for failing nodes.

use crate::commands::{CliError, ProofLocator};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_engine::explore::models;
use athanor_engine::Engine;
use clap::Args;
use std::error::Error;

/// Arguments for the `model` subcommand.
#[derive(Args)]
pub struct ModelArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// Nodes to fetch models for; defaults to the failing set.
    pub nodes: Vec<u64>,
}

/// Executes the `model` subcommand.
#[async_trait]
impl super::Command for ModelArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let (_store, proof) = self.locator.open()?;
        let engine = self.locator.engine()?;

        let nodes: Vec<NodeId> = if self.nodes.is_empty() {
            proof.failing.iter().copied().collect()
        } else {
            self.nodes.iter().copied().map(NodeId).collect()
        };
        if nodes.is_empty() {
            println!("no failing nodes and none requested");
            return Ok(());
        }

        let results = models(&proof, &engine as &dyn Engine, &nodes)
            .await
            .map_err(CliError::Engine)?;
        for (node, assignment) in results {
            match assignment {
                Some(assignment) => {
                    println!("node {node}:");
                    for (name, value) in assignment {
                        println!("  {name} = {value}");
                    }
                }
                None => println!("node {node}: no model (unsat or unknown)"),
            }
        }
        Ok(())
    }
}
