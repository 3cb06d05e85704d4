//! Login flow for tokenrelay.
//!
//! The flow engine drives a [`PageDriver`] through the branchy login surface:
//! account chooser, credential form, forced rename, profile conflict, modal prompts,
//! and finally the JSON page carrying the token. Everything the engine knows about
//! the page goes through [`Marker`]s, so the state machine runs unchanged against a
//! real browser or a [`ScriptedDriver`].

pub mod driver;
pub mod engine;
pub mod error;
pub mod markers;
pub mod name;
pub mod poll;
pub mod request;
pub mod scripted;

pub use driver::{Action, DriverFactory, Marker, PageDriver};
pub use engine::{run_login, FlowEngine, FlowSettings};
pub use error::{DriverError, FlowError};
pub use markers::{extract_token, InitialStep, MarkerSet, PostLoginStep, RATE_LIMIT_PHRASE};
pub use poll::{poll_until, PollPolicy};
pub use request::{Credentials, LoginRequest, ProxyDescriptor, SecondaryAuth};
pub use scripted::{Screen, ScriptedDriver, ScriptedFactory};
