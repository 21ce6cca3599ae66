//! Module for the `remove` subcommand.

use crate::commands::{apply_operation, ProofLocator};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_ops::RemoveNode;
use clap::Args;
use std::error::Error;

/// Arguments for the `remove` subcommand.
#[derive(Args)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// Root of the subtree to prune.
    pub node: u64,
}

/// Executes the `remove` subcommand.
#[async_trait]
impl super::Command for RemoveArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let operation = RemoveNode {
            node: NodeId(self.node),
        };
        apply_operation(&self.locator, &operation).await
    }
}
