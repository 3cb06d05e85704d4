use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_adapter::ChromiumFactory;
use tokenrelay_registry::TaskRegistry;
use tokenrelay_scheduler::Orchestrator;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Resolves the config file path: explicit flag, then `./config/config.yaml`, then the
/// per-user config directory.
fn config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    let local_config = PathBuf::from("config/config.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("tokenrelay");
    path.push("config.yaml");
    Ok(path)
}

/// Loads the YAML config (or defaults when absent) and applies environment overrides.
pub async fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let config_path = config_path(explicit)?;

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Config::default()
    };

    config.apply_env_overrides();
    Ok(config)
}

pub fn build_orchestrator(config: &Config) -> Orchestrator {
    let registry = Arc::new(TaskRegistry::with_retention(config.retention()));
    let factory = Arc::new(ChromiumFactory::new(config.browser_settings()));
    Orchestrator::new(registry, factory, config.flow_settings())
}
