//! In-memory page driver that replays scripted screens.
//!
//! Used by the test suites of every crate in the workspace; no browser involved.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::driver::{Action, DriverFactory, Marker, PageDriver};
use crate::error::DriverError;
use crate::request::LoginRequest;

/// One rendered state of the page: the markers present and its plain text.
#[derive(Clone, Debug, Default)]
pub struct Screen {
    markers: HashSet<Marker>,
    text: String,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, marker: Marker) -> Self {
        self.markers.insert(marker);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Final page carrying `{"token": <token>}`.
    pub fn token_page(token: &str) -> Self {
        Self::new().text(serde_json::json!({ "token": token }).to_string())
    }
}

struct Reaction {
    trigger: Marker,
    next: Screen,
    after_reads: usize,
}

#[derive(Default)]
struct ScriptState {
    screen: Screen,
    reactions: Vec<Reaction>,
    pending: Option<(usize, Screen)>,
    log: Vec<String>,
}

pub struct ScriptedDriver {
    state: Mutex<ScriptState>,
    shutdowns: Arc<AtomicUsize>,
}

impl ScriptedDriver {
    pub fn new(screen: Screen) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                screen,
                ..ScriptState::default()
            }),
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Clicking `trigger` switches to `next` immediately.
    pub fn on_click(self, trigger: Marker, next: Screen) -> Self {
        self.on_click_after(trigger, 0, next)
    }

    /// Clicking `trigger` switches to `next` once `reads` further `locate` calls have
    /// still seen the current screen.
    pub fn on_click_after(self, trigger: Marker, reads: usize, next: Screen) -> Self {
        self.state.lock().reactions.push(Reaction {
            trigger,
            next,
            after_reads: reads,
        });
        self
    }

    fn with_shutdown_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.shutdowns = counter;
        self
    }

    /// Interactions performed so far, e.g. `click:secret next button`.
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn locate(&self, marker: &Marker) -> Result<bool, DriverError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.pending.take() {
            Some((0, next)) => state.screen = next,
            Some((remaining, next)) => state.pending = Some((remaining - 1, next)),
            None => {}
        }
        Ok(state.screen.markers.contains(marker))
    }

    async fn act(&self, marker: &Marker, action: Action) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if !state.screen.markers.contains(marker) {
            return Err(DriverError::NotFound(marker.to_string()));
        }
        match action {
            Action::Input(value) => {
                state.log.push(format!("input:{marker}={value}"));
            }
            Action::Click => {
                state.log.push(format!("click:{marker}"));
                let reaction = state
                    .reactions
                    .iter()
                    .find(|reaction| &reaction.trigger == marker)
                    .map(|reaction| (reaction.after_reads, reaction.next.clone()));
                if let Some((after_reads, next)) = reaction {
                    if after_reads == 0 {
                        state.screen = next;
                    } else {
                        state.pending = Some((after_reads, next));
                    }
                }
            }
        }
        Ok(())
    }

    async fn wait_idle(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_visible(&self, marker: &Marker, _timeout: Duration) -> Result<(), DriverError> {
        if self.state.lock().screen.markers.contains(marker) {
            Ok(())
        } else {
            Err(DriverError::Timeout(marker.to_string()))
        }
    }

    async fn read_text(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().screen.text.clone())
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

type DriverBuilder = Box<dyn Fn(&LoginRequest) -> ScriptedDriver + Send + Sync>;

enum LaunchMode {
    Ready,
    Fail(DriverError),
    Panic,
}

/// Factory handing out a fresh [`ScriptedDriver`] per launch.
pub struct ScriptedFactory {
    build: DriverBuilder,
    mode: LaunchMode,
    delay: Duration,
    launches: AtomicUsize,
    shutdowns: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&LoginRequest) -> ScriptedDriver + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
            mode: LaunchMode::Ready,
            delay: Duration::ZERO,
            launches: AtomicUsize::new(0),
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every launch lands directly on a token page.
    pub fn token(token: &str) -> Self {
        let token = token.to_string();
        Self::new(move |_| ScriptedDriver::new(Screen::token_page(&token)))
    }

    pub fn failing(err: DriverError) -> Self {
        let mut factory = Self::new(|_| ScriptedDriver::new(Screen::new()));
        factory.mode = LaunchMode::Fail(err);
        factory
    }

    /// Launch panics, standing in for a crashed automation backend.
    pub fn panicking() -> Self {
        let mut factory = Self::new(|_| ScriptedDriver::new(Screen::new()));
        factory.mode = LaunchMode::Panic;
        factory
    }

    /// Sleeps before each launch resolves.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverFactory for ScriptedFactory {
    async fn launch(
        &self,
        request: &LoginRequest,
        _page_load_timeout: Duration,
    ) -> Result<Box<dyn PageDriver>, DriverError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.mode {
            LaunchMode::Ready => {}
            LaunchMode::Fail(err) => return Err(err.clone()),
            LaunchMode::Panic => panic!("scripted automation backend crashed"),
        }
        let driver = (self.build)(request).with_shutdown_counter(Arc::clone(&self.shutdowns));
        Ok(Box::new(driver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn click_reaction_switches_screen_after_reads() {
        let driver = ScriptedDriver::new(Screen::new().with(Marker::SecretNext))
            .on_click_after(Marker::SecretNext, 2, Screen::token_page("t"));

        driver.act(&Marker::SecretNext, Action::Click).await.unwrap();
        assert!(driver.locate(&Marker::SecretNext).await.unwrap());
        assert!(driver.locate(&Marker::SecretNext).await.unwrap());
        assert!(!driver.locate(&Marker::SecretNext).await.unwrap());
        assert_eq!(driver.read_text().await.unwrap(), "{\"token\":\"t\"}");
    }

    #[tokio::test]
    async fn acting_on_absent_marker_fails() {
        let driver = ScriptedDriver::new(Screen::new());
        let err = driver
            .act(&Marker::IdentifierNext, Action::Click)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::NotFound(_)));
    }
}
