mod cli;
mod engine;
mod history;
mod model;
mod orchestrator;
mod presenter;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();

    // Log lines would draw over the alternate screen, so the TUI only logs on request.
    if !args.is_interactive() || std::env::var_os("RUST_LOG").is_some() {
        init_logging(args.verbose);
    }

    cli::run(args).await
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "contratos_cli=warn",
        1 => "contratos_cli=info",
        _ => "contratos_cli=debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
