use anyhow::{Context, Result};
use tokenrelay_flow::{Credentials, LoginRequest};
use tracing::info;

use super::args::LoginArgs;
use super::runtime::build_orchestrator;
use crate::config::Config;

pub async fn cmd_login(args: LoginArgs, config: Config) -> Result<()> {
    let mut request = LoginRequest::new(Credentials::new(args.email, args.password), args.url);
    request.mobile = args.mobile;

    let orchestrator = build_orchestrator(&config);
    info!(account = %request.account(), "running one-shot login");
    let token = orchestrator
        .run_now(request)
        .await
        .context("login flow failed")?;
    println!("{token}");
    Ok(())
}
