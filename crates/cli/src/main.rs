use athanor_cli::commands::{Cmd, Command};
use clap::Parser;

/// Athanor CLI
///
/// Athanor drives symbolic-execution proofs of Solidity test methods
/// through an external rewrite engine: batch proving, proof inspection,
/// and interactive graph refinement (merge, split, section, refute).
#[derive(Parser)]
#[command(name = "athanor")]
#[command(about = "Athanor: proof-graph orchestration for Solidity verification")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

/// Runs the Athanor CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
