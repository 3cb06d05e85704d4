use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::driver::{Action, DriverFactory, Marker, PageDriver};
use crate::error::FlowError;
use crate::markers::{
    extract_token, initial_candidates, post_login_candidates, InitialStep, MarkerSet,
    PostLoginStep,
};
use crate::name::random_display_name;
use crate::poll::{poll_until, PollPolicy};
use crate::request::{Credentials, LoginRequest};

/// Extra time granted to a factory beyond its own launch and page-load deadlines.
const LAUNCH_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct FlowSettings {
    /// Budget for starting the automation backend, before navigation begins.
    pub launch_timeout: Duration,
    pub page_load_timeout: Duration,
    pub visible_timeout: Duration,
    pub poll: PollPolicy,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            launch_timeout: Duration::from_secs(20),
            page_load_timeout: Duration::from_secs(30),
            visible_timeout: Duration::from_secs(15),
            poll: PollPolicy::default(),
        }
    }
}

impl FlowSettings {
    /// Outer bound on `DriverFactory::launch`. It must outlast the factory's own
    /// launch and page-load deadlines so the factory gets to clean up after them.
    pub fn launch_deadline(&self) -> Duration {
        self.launch_timeout + self.page_load_timeout + LAUNCH_GRACE
    }
}

/// Login state machine over a driver already positioned at the target URL.
pub struct FlowEngine<'a> {
    driver: &'a dyn PageDriver,
    settings: &'a FlowSettings,
}

impl<'a> FlowEngine<'a> {
    pub fn new(driver: &'a dyn PageDriver, settings: &'a FlowSettings) -> Self {
        Self { driver, settings }
    }

    /// Runs the flow to its terminal state.
    pub async fn run(&self, credentials: &Credentials) -> Result<String, FlowError> {
        let account = credentials.account.as_str();
        let markers = self.observe(initial_candidates(account)).await?;
        let step = InitialStep::decide(&markers, account);
        debug!(?step, "landing page classified");

        match step {
            InitialStep::RateLimited => return Err(FlowError::RateLimited),
            InitialStep::Unrecognized => return self.settled_session().await,
            InitialStep::ClickListedAccount => {
                self.driver
                    .act(&Marker::ListedAccount(account.to_string()), Action::Click)
                    .await?;
                self.driver.wait_idle().await?;
            }
            InitialStep::CredentialForm => self.submit_credentials(credentials).await?,
            InitialStep::PickChooserEntry => {
                self.driver.act(&Marker::ChooserEntry, Action::Click).await?;
                self.submit_credentials(credentials).await?;
            }
        }

        self.post_login().await
    }

    /// A primed session may land straight on the token page; anything else on an
    /// unmarked landing page is unrecognized.
    async fn settled_session(&self) -> Result<String, FlowError> {
        let text = self.driver.read_text().await?;
        match extract_token(&text) {
            Ok(token) => {
                debug!("landing page already carries a token");
                Ok(token)
            }
            Err(FlowError::RateLimited) => Err(FlowError::RateLimited),
            Err(_) => Err(FlowError::UnrecognizedPage),
        }
    }

    async fn observe(&self, candidates: Vec<Marker>) -> Result<MarkerSet, FlowError> {
        let mut markers = MarkerSet::new();
        for marker in candidates {
            if self.driver.locate(&marker).await? {
                markers.insert(marker);
            }
        }
        Ok(markers)
    }

    async fn submit_credentials(&self, credentials: &Credentials) -> Result<(), FlowError> {
        self.driver.wait_idle().await?;
        self.driver
            .act(
                &Marker::IdentifierField,
                Action::Input(credentials.account.clone()),
            )
            .await?;
        self.driver.act(&Marker::IdentifierNext, Action::Click).await?;
        self.driver
            .wait_visible(&Marker::SecretField, self.settings.visible_timeout)
            .await?;
        self.driver
            .act(&Marker::SecretField, Action::Input(credentials.secret.clone()))
            .await?;
        self.driver.act(&Marker::SecretNext, Action::Click).await?;
        self.wait_until_absent(Marker::SecretField).await
    }

    async fn post_login(&self) -> Result<String, FlowError> {
        self.driver.wait_idle().await?;
        let markers = self.observe(post_login_candidates()).await?;
        for step in PostLoginStep::plan(&markers) {
            // An earlier step may already have cleared this one.
            if !self.driver.locate(&step.trigger()).await? {
                debug!(?step, "post-login step no longer applies");
                continue;
            }
            debug!(?step, "handling post-login step");
            match step {
                PostLoginStep::Rename => {
                    self.driver
                        .act(&Marker::RenameField, Action::Input(random_display_name()))
                        .await?;
                    self.driver.act(&Marker::RenameSubmit, Action::Click).await?;
                    self.driver.wait_idle().await?;
                }
                PostLoginStep::ResolveConflict => {
                    self.driver
                        .act(&Marker::ProfileConflictResolve, Action::Click)
                        .await?;
                    self.wait_until_absent(Marker::ProfileConflict).await?;
                }
                PostLoginStep::DismissModal => {
                    self.driver.act(&Marker::ModalContinue, Action::Click).await?;
                    self.driver.wait_idle().await?;
                }
            }
        }

        let text = self.driver.read_text().await?;
        extract_token(&text)
    }

    async fn wait_until_absent(&self, marker: Marker) -> Result<(), FlowError> {
        let what = format!("{marker} to clear");
        let driver = self.driver;
        let marker = &marker;
        poll_until(&self.settings.poll, &what, || async move {
            Ok::<bool, FlowError>(!driver.locate(marker).await?)
        })
        .await
    }
}

/// Launches a driver for `request`, runs the flow, and releases the driver on every
/// exit path.
#[instrument(skip_all, fields(task_id = %request.account()))]
pub async fn run_login(
    factory: &dyn DriverFactory,
    request: &LoginRequest,
    settings: &FlowSettings,
) -> Result<String, FlowError> {
    if !request.secondary.is_empty() {
        debug!(secondary = ?request.secondary, "secondary auth material supplied");
    }
    let launch = factory.launch(request, settings.page_load_timeout);
    let driver = tokio::time::timeout(settings.launch_deadline(), launch)
        .await
        .map_err(|_| FlowError::Timeout("page load".into()))??;

    let outcome = FlowEngine::new(driver.as_ref(), settings)
        .run(&request.credentials)
        .await;
    driver.shutdown().await;

    match &outcome {
        Ok(_) => info!("login flow produced a token"),
        Err(err) => info!(kind = err.kind(), error = %err, "login flow failed"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::scripted::{Screen, ScriptedDriver, ScriptedFactory};

    const ACCOUNT: &str = "a@x.com";

    fn settings() -> FlowSettings {
        FlowSettings {
            launch_timeout: Duration::from_secs(1),
            page_load_timeout: Duration::from_secs(1),
            visible_timeout: Duration::from_millis(10),
            poll: PollPolicy {
                max_attempts: 5,
                interval: Duration::from_millis(1),
                deadline: Duration::from_secs(1),
            },
        }
    }

    fn credentials() -> Credentials {
        Credentials::new(ACCOUNT, "p4ss")
    }

    fn credential_form() -> Screen {
        Screen::new()
            .with(Marker::IdentifierField)
            .with(Marker::IdentifierNext)
    }

    fn secret_form() -> Screen {
        Screen::new()
            .with(Marker::SecretField)
            .with(Marker::SecretNext)
    }

    async fn run(driver: &ScriptedDriver) -> Result<String, FlowError> {
        let settings = settings();
        FlowEngine::new(driver, &settings).run(&credentials()).await
    }

    #[tokio::test]
    async fn token_page_without_markers_succeeds() {
        let driver = ScriptedDriver::new(Screen::token_page("abc123"));
        assert_eq!(run(&driver).await.unwrap(), "abc123");
        assert!(driver.actions().is_empty());
    }

    #[tokio::test]
    async fn unmarked_page_without_token_is_unrecognized() {
        let driver = ScriptedDriver::new(Screen::new().text("<p>maintenance</p>"));
        assert!(matches!(
            run(&driver).await.unwrap_err(),
            FlowError::UnrecognizedPage
        ));
    }

    #[tokio::test]
    async fn listed_account_is_clicked() {
        let driver = ScriptedDriver::new(
            Screen::new().with(Marker::ListedAccount(ACCOUNT.into())),
        )
        .on_click(
            Marker::ListedAccount(ACCOUNT.into()),
            Screen::token_page("abc123"),
        );

        assert_eq!(run(&driver).await.unwrap(), "abc123");
        assert_eq!(driver.actions(), vec!["click:listed account entry"]);
    }

    #[tokio::test]
    async fn credential_form_waits_for_secret_field_to_clear() {
        let driver = ScriptedDriver::new(credential_form())
            .on_click(Marker::IdentifierNext, secret_form())
            .on_click_after(Marker::SecretNext, 2, Screen::token_page("tok"));

        assert_eq!(run(&driver).await.unwrap(), "tok");
        assert_eq!(
            driver.actions(),
            vec![
                "input:identifier field=a@x.com",
                "click:identifier next button",
                "input:secret field=p4ss",
                "click:secret next button",
            ]
        );
    }

    #[tokio::test]
    async fn secret_field_that_never_clears_times_out() {
        let driver = ScriptedDriver::new(credential_form())
            .on_click(Marker::IdentifierNext, secret_form());

        let err = run(&driver).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timed out waiting for secret field to clear");
    }

    #[tokio::test]
    async fn missing_secret_field_times_out() {
        let driver = ScriptedDriver::new(credential_form())
            .on_click(Marker::IdentifierNext, Screen::new());

        assert!(run(&driver).await.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn generic_chooser_entry_leads_to_form() {
        let driver = ScriptedDriver::new(Screen::new().with(Marker::ChooserEntry))
            .on_click(Marker::ChooserEntry, credential_form())
            .on_click(Marker::IdentifierNext, secret_form())
            .on_click(Marker::SecretNext, Screen::token_page("tok"));

        assert_eq!(run(&driver).await.unwrap(), "tok");
        assert_eq!(driver.actions()[0], "click:chooser entry");
    }

    #[tokio::test]
    async fn rate_limited_landing_page_fails_fast() {
        let driver = ScriptedDriver::new(
            Screen::new()
                .with(Marker::RateLimitNotice)
                .with(Marker::IdentifierField)
                .text("too many people trying to log in"),
        );

        let err = run(&driver).await.unwrap_err();
        assert!(matches!(err, FlowError::RateLimited));
        assert!(driver.actions().is_empty());
    }

    #[tokio::test]
    async fn rename_prompt_gets_random_name() {
        let renamed = Screen::token_page("tok");
        let driver = ScriptedDriver::new(
            Screen::new().with(Marker::ListedAccount(ACCOUNT.into())),
        )
        .on_click(
            Marker::ListedAccount(ACCOUNT.into()),
            Screen::new()
                .with(Marker::RenameField)
                .with(Marker::RenameSubmit),
        )
        .on_click(Marker::RenameSubmit, renamed);

        assert_eq!(run(&driver).await.unwrap(), "tok");
        let actions = driver.actions();
        let input = actions
            .iter()
            .find(|action| action.starts_with("input:rename field="))
            .expect("rename input");
        assert_eq!(input.trim_start_matches("input:rename field=").len(), 7);
        assert_eq!(actions.last().unwrap(), "click:rename submit");
    }

    #[tokio::test]
    async fn profile_conflict_is_resolved_then_modal_dismissed() {
        let driver = ScriptedDriver::new(
            Screen::new().with(Marker::ListedAccount(ACCOUNT.into())),
        )
        .on_click(
            Marker::ListedAccount(ACCOUNT.into()),
            Screen::new()
                .with(Marker::ProfileConflict)
                .with(Marker::ProfileConflictResolve)
                .with(Marker::ModalPrompt)
                .with(Marker::ModalContinue),
        )
        .on_click_after(
            Marker::ProfileConflictResolve,
            1,
            Screen::new()
                .with(Marker::ModalPrompt)
                .with(Marker::ModalContinue),
        )
        .on_click(Marker::ModalContinue, Screen::token_page("tok"));

        assert_eq!(run(&driver).await.unwrap(), "tok");
        assert_eq!(
            driver.actions(),
            vec![
                "click:listed account entry",
                "click:profile conflict resolve button",
                "click:modal continue link",
            ]
        );
    }

    #[tokio::test]
    async fn step_cleared_by_earlier_step_is_skipped() {
        // Rename and modal share one dialog: submitting the rename closes it.
        let driver = ScriptedDriver::new(
            Screen::new().with(Marker::ListedAccount(ACCOUNT.into())),
        )
        .on_click(
            Marker::ListedAccount(ACCOUNT.into()),
            Screen::new()
                .with(Marker::RenameField)
                .with(Marker::RenameSubmit)
                .with(Marker::ModalPrompt),
        )
        .on_click(Marker::RenameSubmit, Screen::token_page("tok"));

        assert_eq!(run(&driver).await.unwrap(), "tok");
        assert!(!driver
            .actions()
            .iter()
            .any(|action| action.contains("modal")));
    }

    #[tokio::test]
    async fn rate_limit_on_final_page_is_reported() {
        let driver = ScriptedDriver::new(
            Screen::new().with(Marker::ListedAccount(ACCOUNT.into())),
        )
        .on_click(
            Marker::ListedAccount(ACCOUNT.into()),
            Screen::new().text("too many people trying to logon"),
        );

        assert!(matches!(
            run(&driver).await.unwrap_err(),
            FlowError::RateLimited
        ));
    }

    #[tokio::test]
    async fn run_login_releases_driver_on_success_and_failure() {
        let request = LoginRequest::new(credentials(), "https://example/login");

        let ok = ScriptedFactory::new(|_| {
            ScriptedDriver::new(Screen::new().with(Marker::ListedAccount(ACCOUNT.into())))
                .on_click(
                    Marker::ListedAccount(ACCOUNT.into()),
                    Screen::token_page("abc123"),
                )
        });
        assert_eq!(
            run_login(&ok, &request, &settings()).await.unwrap(),
            "abc123"
        );
        assert_eq!(ok.shutdowns(), 1);

        let failing = ScriptedFactory::new(|_| ScriptedDriver::new(Screen::new()));
        assert!(run_login(&failing, &request, &settings()).await.is_err());
        assert_eq!(failing.shutdowns(), 1);
    }

    #[tokio::test]
    async fn launch_timeout_is_a_flow_timeout() {
        let request = LoginRequest::new(credentials(), "https://example/login");
        let factory = ScriptedFactory::failing(DriverError::Timeout("page load".into()));
        let err = run_login(&factory, &request, &settings()).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(factory.shutdowns(), 0);
    }

    #[test]
    fn launch_deadline_outlasts_factory_deadlines() {
        let settings = FlowSettings {
            launch_timeout: Duration::from_secs(20),
            page_load_timeout: Duration::from_secs(30),
            ..FlowSettings::default()
        };
        assert!(settings.launch_deadline() > Duration::from_secs(50));
    }
}
