use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TOKENRELAY_GIT_HASH"),
    ", built ",
    env!("TOKENRELAY_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Serve the task API over HTTP
    Serve(ServeArgs),

    /// Run a single login in the foreground and print the token
    Login(LoginArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Interface to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config and environment)
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds to wait for in-flight tasks on shutdown
    #[arg(long, default_value_t = 30)]
    pub grace_secs: u64,
}

#[derive(Args, Clone)]
pub struct LoginArgs {
    /// Sign-in page to open
    #[arg(long)]
    pub url: String,

    /// Account identifier
    #[arg(long)]
    pub email: String,

    /// Account secret
    #[arg(long)]
    pub password: String,

    /// Use the mobile user agent and window size
    #[arg(long)]
    pub mobile: bool,
}
