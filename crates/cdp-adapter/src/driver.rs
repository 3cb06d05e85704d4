use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokenrelay_flow::{Action, DriverError, DriverFactory, LoginRequest, Marker, PageDriver};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::cookies::parse_records;
use crate::metrics;
use crate::proxy::ProxyArgs;
use crate::selectors::{lookup, Lookup};

const VISIBILITY_POLL: Duration = Duration::from_millis(100);
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Launches one dedicated Chromium instance per login run.
pub struct ChromiumFactory {
    settings: BrowserSettings,
}

impl ChromiumFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    /// Chromium switches for one run: base flags for the device profile plus proxy flags.
    fn launch_args(&self, request: &LoginRequest) -> Vec<String> {
        let mut args = self.settings.launch_args(request.mobile);
        if let Some(proxy) = &request.proxy {
            let proxy_args = ProxyArgs::from_descriptor(proxy);
            if proxy_args.dropped_credentials {
                warn!("inline proxy credentials are not forwarded to chromium");
            }
            info!(scheme = %proxy.protocol, "routing browser through proxy");
            args.extend(proxy_args.into_args());
        }
        args
    }

    fn browser_config(&self, request: &LoginRequest) -> Result<BrowserConfig, DriverError> {
        let mut builder = BrowserConfig::builder().launch_timeout(self.settings.launch_timeout);
        if !self.settings.headless {
            builder = builder.with_head();
        }
        match self.settings.resolve_executable() {
            Some(executable) => builder = builder.chrome_executable(executable),
            None => debug!("no chrome executable found, leaving detection to chromiumoxide"),
        }
        if let Some((width, height)) = self.settings.window_size(request.mobile) {
            builder = builder.window_size(width, height);
        }

        builder
            .args(self.launch_args(request))
            .build()
            .map_err(|err| DriverError::Launch(format!("browser config error: {err}")))
    }
}

#[async_trait]
impl DriverFactory for ChromiumFactory {
    async fn launch(
        &self,
        request: &LoginRequest,
        page_load_timeout: Duration,
    ) -> Result<Box<dyn PageDriver>, DriverError> {
        let started = Instant::now();
        let config = self.browser_config(request)?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(|err| {
            metrics::record_launch("error");
            DriverError::Launch(err.to_string())
        })?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let opened = timeout(page_load_timeout, open_page(&browser, request)).await;
        let page = match opened {
            Ok(Ok(page)) => page,
            Ok(Err(err)) => {
                metrics::record_launch("error");
                close_browser(browser, &handler).await;
                return Err(err);
            }
            Err(_) => {
                metrics::record_launch("timeout");
                close_browser(browser, &handler).await;
                return Err(DriverError::Timeout("page load".into()));
            }
        };
        metrics::record_launch("ok");
        metrics::observe_page_load(started.elapsed());

        Ok(Box::new(ChromiumDriver {
            page,
            browser: Mutex::new(Some(browser)),
            handler,
            idle_timeout: self.settings.idle_timeout,
        }))
    }
}

/// Opens a blank tab, installs the session cookies, then navigates to the target.
async fn open_page(browser: &Browser, request: &LoginRequest) -> Result<Page, DriverError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|err| DriverError::Navigation(format!("failed to create page: {err}")))?;

    let records = parse_records(&request.cookies);
    for record in &records {
        let command = match record.to_command() {
            Ok(command) => command,
            Err(err) => {
                debug!(name = %record.name, %err, "skipping unusable cookie");
                continue;
            }
        };
        page.execute(command)
            .await
            .map_err(|err| DriverError::Io(format!("failed to set cookie: {err}")))?;
    }
    if !records.is_empty() {
        debug!(count = records.len(), "session cookies installed");
    }

    page.goto(request.url.as_str())
        .await
        .map_err(|err| DriverError::Navigation(err.to_string()))?;
    Ok(page)
}

async fn close_browser(mut browser: Browser, handler: &JoinHandle<()>) {
    if let Err(err) = browser.close().await {
        debug!(%err, "browser close failed");
    }
    if let Err(err) = browser.wait().await {
        debug!(%err, "waiting for browser exit failed");
    }
    handler.abort();
}

/// [`PageDriver`] over a single Chromium tab.
pub struct ChromiumDriver {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
    idle_timeout: Duration,
}

impl ChromiumDriver {
    fn io(err: impl std::fmt::Display) -> DriverError {
        DriverError::Io(err.to_string())
    }

    async fn is_visible(&self, selector: &str) -> bool {
        match self.page.find_element(selector).await {
            Ok(element) => element.clickable_point().await.is_ok(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn locate(&self, marker: &Marker) -> Result<bool, DriverError> {
        match lookup(marker) {
            Lookup::Phrase(phrase) => {
                let content = self.page.content().await.map_err(Self::io)?;
                Ok(content.contains(phrase))
            }
            Lookup::Css(selector) => Ok(self.page.find_element(selector).await.is_ok()),
        }
    }

    async fn act(&self, marker: &Marker, action: Action) -> Result<(), DriverError> {
        let Lookup::Css(selector) = lookup(marker) else {
            return Err(DriverError::NotFound(marker.to_string()));
        };
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::NotFound(marker.to_string()))?;
        match action {
            Action::Click => {
                element.click().await.map_err(Self::io)?;
            }
            Action::Input(value) => {
                element.click().await.map_err(Self::io)?;
                element.type_str(value).await.map_err(Self::io)?;
            }
        }
        Ok(())
    }

    async fn wait_idle(&self) -> Result<(), DriverError> {
        if timeout(self.idle_timeout, self.page.wait_for_navigation())
            .await
            .is_err()
        {
            debug!(timeout = ?self.idle_timeout, "page still busy, continuing");
        }
        sleep(SETTLE_DELAY).await;
        Ok(())
    }

    async fn wait_visible(&self, marker: &Marker, limit: Duration) -> Result<(), DriverError> {
        let Lookup::Css(selector) = lookup(marker) else {
            return Err(DriverError::NotFound(marker.to_string()));
        };
        let deadline = Instant::now() + limit;
        loop {
            if self.is_visible(&selector).await {
                return Ok(());
            }
            if Instant::now() + VISIBILITY_POLL > deadline {
                return Err(DriverError::Timeout(marker.to_string()));
            }
            sleep(VISIBILITY_POLL).await;
        }
    }

    async fn read_text(&self) -> Result<String, DriverError> {
        let body = self
            .page
            .find_element("body")
            .await
            .map_err(|_| DriverError::NotFound("page body".into()))?;
        let text = body.inner_text().await.map_err(Self::io)?;
        Ok(text.unwrap_or_default())
    }

    async fn shutdown(&self) {
        let Some(browser) = self.browser.lock().await.take() else {
            return;
        };
        close_browser(browser, &self.handler).await;
        debug!("browser released");
    }
}
