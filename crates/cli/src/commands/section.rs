//! Module for the `section` subcommand.

use crate::commands::{apply_operation, ProofLocator};
use async_trait::async_trait;
use athanor_core::kcfg::NodeId;
use athanor_ops::SectionEdge;
use clap::Args;
use std::error::Error;

/// Arguments for the `section` subcommand.
#[derive(Args)]
pub struct SectionArgs {
    #[command(flatten)]
    pub locator: ProofLocator,
    /// Source node of the edge to subdivide.
    pub source: u64,
    /// Target node of the edge to subdivide.
    pub target: u64,
    /// Number of pieces to cut the edge into.
    #[arg(default_value_t = 2)]
    pub sections: usize,
}

/// Executes the `section` subcommand.
#[async_trait]
impl super::Command for SectionArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let operation = SectionEdge {
            source: NodeId(self.source),
            target: NodeId(self.target),
            sections: self.sections,
        };
        apply_operation(&self.locator, &operation).await
    }
}
