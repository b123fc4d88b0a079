//! refill - Record and replay engine for HTML form interactions
//!
//! Main entry point for the CLI application.

use clap::Parser;
use refill::cli::{self, Command};
use refill::RefillConfig;

/// refill - record and replay HTML form interactions
#[derive(Parser, Debug)]
#[command(name = "refill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Override the element wait timeout in milliseconds
    #[arg(long)]
    element_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = RefillConfig::load();

    // Apply CLI overrides
    if args.debug {
        config.debug = true;
    }
    if let Some(timeout) = args.element_timeout_ms {
        config.replay.element_timeout_ms = timeout;
    }

    let default_filter = if config.debug {
        "refill=debug"
    } else {
        "refill=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::execute(args.command, &config).await?;

    Ok(())
}
