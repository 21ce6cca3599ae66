//! Module for the `merge` subcommand.

use crate::commands::{apply_operation, ProofLocator};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_ops::MergeNodes;
use clap::Args;
use std::error::Error;

/// Arguments for the `merge` subcommand.
#[derive(Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// Node ids to merge; at least two.
    #[arg(required = true, num_args = 2..)]
    pub nodes: Vec<u64>,
    /// Attach the disjunction of the originals' constraints to the
    /// generalized node.
    #[arg(long)]
    pub include_disjunct: bool,
}

/// Executes the `merge` subcommand.
#[async_trait]
impl super::Command for MergeArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let operation = MergeNodes {
            nodes: self.nodes.iter().copied().map(NodeId).collect(),
            include_disjunct: self.include_disjunct,
        };
        apply_operation(&self.locator, &operation).await
    }
}
