//! Task orchestration for tokenrelay.
//!
//! [`Orchestrator::submit`] registers a login task and hands it to a supervised
//! background worker; the supervisor guarantees that every run, panics included,
//! ends with a terminal entry in the [`TaskRegistry`](tokenrelay_registry::TaskRegistry).

pub mod metrics;
pub mod orchestrator;

pub use orchestrator::Orchestrator;
