use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod menu;

use cli::{execute_command, Cli};

fn main() -> Result<()> {
    // Logs go to stderr so the menu keeps stdout to itself
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    execute_command(&cli).with_context(|| "command execution failed")
}
