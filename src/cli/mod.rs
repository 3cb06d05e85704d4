//! Command-line entry point.

mod args;
mod login;
mod runtime;
mod serve;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

pub use args::{CliArgs, Commands, LoginArgs, ServeArgs};
pub use runtime::{build_orchestrator, init_logging, load_config};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(&cli.log_level, cli.debug)?;

    info!("Starting tokenrelay v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(cli.config.as_ref()).await?;

    let outcome = match cli.command {
        Commands::Serve(args) => serve::cmd_serve(args, config).await,
        Commands::Login(args) => login::cmd_login(args, config).await,
    };
    if let Err(err) = &outcome {
        error!("Command failed: {:#}", err);
    }
    outcome
}
