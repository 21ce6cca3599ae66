//! Module for the `split` subcommand.

use crate::commands::{apply_operation, ProofLocator};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_ops::SplitNode;
use clap::Args;
use std::error::Error;

/// Arguments for the `split` subcommand.
#[derive(Args)]
pub struct SplitArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// The pending node to branch.
    pub node: u64,
    /// Boolean condition over the node's variables, e.g.
    /// `"V0_amount <= 1000"`.
    pub condition: String,
}

/// Executes the `split` subcommand.
#[async_trait]
impl super::Command for SplitArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let operation = SplitNode {
            node: NodeId(self.node),
            condition: self.condition.clone(),
        };
        apply_operation(&self.locator, &operation).await
    }
}
