//! Task lifecycle storage for tokenrelay.
//!
//! The registry is the only shared mutable state in the service: submitted login
//! tasks are recorded here as `Processing`, flipped once to a terminal state by
//! their worker, and evicted after the retention window.

pub mod model;
pub mod state;

pub use model::{RunId, TaskId, TaskOutcome, TaskRecord, TaskStatus};
pub use state::{TaskRegistry, DEFAULT_RETENTION};
