//! Dodel CLI binary.

use anyhow::Result;
use dodel::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the dodel CLI.
///
/// Uses tokio's current_thread runtime; each command is a short sequence of
/// file reads and writes.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Can be controlled via RUST_LOG environment variable
    // Example: RUST_LOG=dodel=debug,dodel_snapshot=trace cargo run -- feed
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dodel=info,dodel_snapshot=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting dodel CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Dodel CLI completed successfully");
    Ok(())
}
