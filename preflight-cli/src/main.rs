use anyhow::Result;
use clap::Parser;
use preflight_core::PreflightConfig;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let args = Cli::parse();
    let config = PreflightConfig::from_env();

    match args.command {
        Command::Install(install_args) => {
            commands::install::run(install_args, &config).await?;
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
