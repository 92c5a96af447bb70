//! Palaver REST API entry point.
//!
//! Binary name: `palaver`
//!
//! Parses CLI arguments, installs tracing, then dispatches to the command.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use palaver_observe::tracing_setup::{TracingOptions, default_filter, init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        default_filter: default_filter(cli.verbosity()),
        format: cli.log_format,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve(args) => cli::serve::run(args).await,
    };

    shutdown_tracing();
    result
}
