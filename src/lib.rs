//! tokenrelay: runs browser sign-in flows as background tasks behind a small HTTP API
//! and hands out the session token each flow ends on.

pub mod cli;
pub mod config;
pub mod metrics;
pub mod server;
