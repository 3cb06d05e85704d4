//! Service configuration.
//!
//! Loaded from YAML; every field has a default so a partial (or missing) file works.
//! A handful of environment variables override the file for container deployments.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use cdp_adapter::BrowserSettings;
use serde::{Deserialize, Serialize};
use tokenrelay_flow::{FlowSettings, PollPolicy};
use tracing::warn;

pub const ENV_ACCESS_KEY: &str = "TOKENRELAY_ACCESS_KEY";
pub const ENV_PORT: &str = "TOKENRELAY_PORT";
pub const ENV_HEADLESS: &str = "TOKENRELAY_HEADLESS";
pub const ENV_CHROME: &str = "TOKENRELAY_CHROME";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// Shared secret every task request must carry.
    pub access_key: String,
    pub tasks: TaskConfig,
    pub flow: FlowConfig,
    pub browser: BrowserConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub retention_secs: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            retention_secs: 30 * 60,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub launch_timeout_secs: u64,
    pub page_load_timeout_secs: u64,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    pub poll_deadline_secs: u64,
    pub visible_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            launch_timeout_secs: 20,
            page_load_timeout_secs: 30,
            poll_attempts: 30,
            poll_interval_ms: 1_000,
            poll_deadline_secs: 45,
            visible_timeout_secs: 15,
            idle_timeout_secs: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub lang: String,
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: false,
            lang: "en-US".to_string(),
            user_agent: None,
        }
    }
}

impl Config {
    /// Applies `TOKENRELAY_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_var(ENV_ACCESS_KEY) {
            self.access_key = key;
        }
        if let Some(raw) = non_empty_var(ENV_PORT) {
            match raw.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %raw, "ignoring invalid {ENV_PORT}"),
            }
        }
        if let Some(raw) = non_empty_var(ENV_HEADLESS) {
            self.browser.headless = matches!(
                raw.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(path) = non_empty_var(ENV_CHROME) {
            self.browser.executable = Some(PathBuf::from(path));
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.tasks.retention_secs)
    }

    pub fn flow_settings(&self) -> FlowSettings {
        let flow = &self.flow;
        FlowSettings {
            launch_timeout: Duration::from_secs(flow.launch_timeout_secs),
            page_load_timeout: Duration::from_secs(flow.page_load_timeout_secs),
            visible_timeout: Duration::from_secs(flow.visible_timeout_secs),
            poll: PollPolicy {
                max_attempts: flow.poll_attempts,
                interval: Duration::from_millis(flow.poll_interval_ms),
                deadline: Duration::from_secs(flow.poll_deadline_secs),
            },
        }
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        let defaults = BrowserSettings::default();
        BrowserSettings {
            executable: self.browser.executable.clone(),
            headless: self.browser.headless,
            lang: self.browser.lang.clone(),
            user_agent: self
                .browser
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
            idle_timeout: Duration::from_secs(self.flow.idle_timeout_secs),
            launch_timeout: Duration::from_secs(self.flow.launch_timeout_secs),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
