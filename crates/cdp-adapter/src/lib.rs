//! Chromium page driver for tokenrelay.
//!
//! Every login run gets its own browser process, primed with the request's proxy and
//! session cookies before it navigates to the login URL. Markers are resolved to CSS
//! selectors (or a page-content phrase) in [`selectors`].

pub mod config;
pub mod cookies;
pub mod driver;
pub mod metrics;
pub mod proxy;
pub mod selectors;

pub use config::BrowserSettings;
pub use cookies::CookieRecord;
pub use driver::{ChromiumDriver, ChromiumFactory};
pub use proxy::ProxyArgs;
