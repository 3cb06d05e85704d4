use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::FlowError;

/// Bounds for waiting on a condition that has no completion signal.
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(45),
        }
    }
}

/// Re-runs `check` until it reports `true`.
///
/// Stops after `max_attempts` checks or once the next sleep would cross the
/// deadline, whichever comes first, and fails with [`FlowError::Timeout`] naming `what`.
pub async fn poll_until<F, Fut>(
    policy: &PollPolicy,
    what: &str,
    mut check: F,
) -> Result<(), FlowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, FlowError>>,
{
    let deadline = Instant::now() + policy.deadline;
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        if check().await? {
            return Ok(());
        }
        if attempt == attempts || Instant::now() + policy.interval > deadline {
            break;
        }
        sleep(policy.interval).await;
    }
    Err(FlowError::Timeout(what.to_string()))
}
