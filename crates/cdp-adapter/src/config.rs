use std::path::{Path, PathBuf};
use std::time::Duration;

use which::which;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36";

const MOBILE_WINDOW: (u32, u32) = (412, 915);

/// Browser launch options shared by every login run.
#[derive(Clone, Debug)]
pub struct BrowserSettings {
    /// Explicit Chrome/Chromium binary. Auto-detected when unset.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub lang: String,
    pub user_agent: String,
    /// Upper bound for one `wait_idle` call.
    pub idle_timeout: Duration,
    /// How long Chromium may take to come up before navigation starts.
    pub launch_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: false,
            lang: "en-US".to_string(),
            user_agent: DESKTOP_USER_AGENT.to_string(),
            idle_timeout: Duration::from_secs(10),
            launch_timeout: Duration::from_secs(20),
        }
    }
}

impl BrowserSettings {
    /// Command-line switches for one launch, excluding proxy flags.
    pub fn launch_args(&self, mobile: bool) -> Vec<String> {
        let user_agent = if mobile {
            MOBILE_USER_AGENT
        } else {
            self.user_agent.as_str()
        };
        vec![
            "--disable-extensions".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--lang={}", self.lang),
            format!("--user-agent={user_agent}"),
        ]
    }

    pub fn window_size(&self, mobile: bool) -> Option<(u32, u32)> {
        mobile.then_some(MOBILE_WINDOW)
    }

    /// Executable to launch: the configured one when it exists, otherwise the first
    /// Chrome found on `PATH` or in the usual install locations.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        detect_chrome_executable(self.executable.as_deref())
    }
}

fn detect_chrome_executable(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured chrome executable not found");
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }
}
