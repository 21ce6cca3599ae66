//! Modules for the `refute` and `unrefute` subcommands.

use crate::commands::{apply_operation, ProofLocator};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_ops::{RefuteNode, UnrefuteNode};
use clap::Args;
use std::error::Error;

/// Arguments for the `refute` subcommand.
#[derive(Args)]
pub struct RefuteArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// The pending node to refute.
    pub node: u64,
}

/// Arguments for the `unrefute` subcommand.
#[derive(Args)]
pub struct UnrefuteArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// The refuted node to restore.
    pub node: u64,
}

/// Executes the `refute` subcommand.
#[async_trait]
impl super::Command for RefuteArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let operation = RefuteNode {
            node: NodeId(self.node),
        };
        apply_operation(&self.locator, &operation).await
    }
}

/// Executes the `unrefute` subcommand.
#[async_trait]
impl super::Command for UnrefuteArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let operation = UnrefuteNode {
            node: NodeId(self.node),
        };
        apply_operation(&self.locator, &operation).await
    }
}
