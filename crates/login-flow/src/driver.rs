use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::request::LoginRequest;

/// A detectable condition or actionable control on the login surface.
///
/// How a marker maps onto the rendered page is the driver's business; the engine only
/// asks whether it is present and acts on it.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Marker {
    /// "Too many people" notice shown when the login surface throttles sessions.
    RateLimitNotice,
    /// Account chooser entry already bound to the given account identifier.
    ListedAccount(String),
    /// Chooser entry not bound to any identifier ("use another account").
    ChooserEntry,
    IdentifierField,
    IdentifierNext,
    SecretField,
    SecretNext,
    RenameField,
    RenameSubmit,
    ProfileConflict,
    ProfileConflictResolve,
    ModalPrompt,
    ModalContinue,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::RateLimitNotice => f.write_str("rate-limit notice"),
            Marker::ListedAccount(_) => f.write_str("listed account entry"),
            Marker::ChooserEntry => f.write_str("chooser entry"),
            Marker::IdentifierField => f.write_str("identifier field"),
            Marker::IdentifierNext => f.write_str("identifier next button"),
            Marker::SecretField => f.write_str("secret field"),
            Marker::SecretNext => f.write_str("secret next button"),
            Marker::RenameField => f.write_str("rename field"),
            Marker::RenameSubmit => f.write_str("rename submit"),
            Marker::ProfileConflict => f.write_str("profile conflict"),
            Marker::ProfileConflictResolve => f.write_str("profile conflict resolve button"),
            Marker::ModalPrompt => f.write_str("modal prompt"),
            Marker::ModalContinue => f.write_str("modal continue link"),
        }
    }
}

/// Interaction performed on a located marker.
#[derive(Clone, Eq, PartialEq)]
pub enum Action {
    Click,
    Input(String),
}

// Input values carry credentials; keep them out of debug output.
impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click => f.write_str("Click"),
            Action::Input(_) => f.write_str("Input(<redacted>)"),
        }
    }
}

/// Capability surface the flow engine needs from a navigable page.
///
/// A driver is owned by exactly one task for its whole lifetime and must release
/// its backend in [`PageDriver::shutdown`].
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Reports whether `marker` is currently present. Absence is `Ok(false)`, not an error.
    async fn locate(&self, marker: &Marker) -> Result<bool, DriverError>;

    async fn act(&self, marker: &Marker, action: Action) -> Result<(), DriverError>;

    /// Waits until the page has settled after an interaction.
    async fn wait_idle(&self) -> Result<(), DriverError>;

    async fn wait_visible(&self, marker: &Marker, timeout: Duration) -> Result<(), DriverError>;

    /// Rendered page content as plain text (not markup).
    async fn read_text(&self) -> Result<String, DriverError>;

    async fn shutdown(&self);
}

/// Opens a primed driver (proxy, cookies) positioned at the request's target URL.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn launch(
        &self,
        request: &LoginRequest,
        page_load_timeout: Duration,
    ) -> Result<Box<dyn PageDriver>, DriverError>;
}
