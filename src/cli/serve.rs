use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::args::ServeArgs;
use super::runtime::build_orchestrator;
use crate::config::{Config, ENV_ACCESS_KEY};
use crate::metrics;
use crate::server::{build_router, AppState};

pub async fn cmd_serve(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if config.access_key.trim().is_empty() {
        bail!("no access key configured; set access_key in the config file or {ENV_ACCESS_KEY}");
    }

    metrics::register_metrics();
    let orchestrator = Arc::new(build_orchestrator(&config));
    let router = build_router(AppState::new(Arc::clone(&orchestrator), &config.access_key));

    let addr = (config.server.host.as_str(), config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}:{}", addr.0, addr.1))?;
    let local = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!("Task API listening on http://{}", local);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("task server exited unexpectedly")?;

    info!("Server stopped, draining login tasks");
    if !orchestrator.shutdown(Duration::from_secs(args.grace_secs)).await {
        warn!("exiting with login tasks still running");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
