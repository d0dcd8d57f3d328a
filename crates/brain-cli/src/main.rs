//! brain — demo wiring for the turn runtime.
//!
//! Connects every crate (C1-C13) into one in-process binary so the runtime
//! can be exercised from a terminal. Not a transport: no HTTP/WebSocket
//! surface, no daemon, no concrete Gmail/Calendar backends — those are
//! explicitly out of scope (spec §1).

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod chat;
mod doctor;
mod wiring;

use wiring::Runtime;

/// brain — turn runtime demo CLI
#[derive(Parser)]
#[command(name = "brain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session against the in-process runtime.
    Chat,
    /// Run health checks: config, memory store, telemetry store.
    Doctor,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = brain_config::BrainConfig::from_env();

    match cli.command {
        Commands::Chat => {
            let mut runtime = Runtime::build(&config)?;
            chat::run(&mut runtime).await?;
        }
        Commands::Doctor => {
            doctor::run(&config)?;
        }
    }

    Ok(())
}
