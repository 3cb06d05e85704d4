use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokenrelay_flow::{run_login, DriverFactory, FlowError, FlowSettings, LoginRequest};
use tokenrelay_registry::{RunId, TaskId, TaskOutcome, TaskRegistry};
use tokio::task::JoinError;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::metrics;

/// Accepts login tasks and runs each on its own supervised worker.
pub struct Orchestrator {
    registry: Arc<TaskRegistry>,
    factory: Arc<dyn DriverFactory>,
    settings: Arc<FlowSettings>,
    tracker: TaskTracker,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<TaskRegistry>,
        factory: Arc<dyn DriverFactory>,
        settings: FlowSettings,
    ) -> Self {
        Self {
            registry,
            factory,
            settings: Arc::new(settings),
            tracker: TaskTracker::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Number of submitted tasks whose supervisor has not finished yet.
    pub fn tracked(&self) -> usize {
        self.tracker.len()
    }

    /// Registers the task as processing and starts it in the background.
    ///
    /// Returns before the flow has touched the driver factory. Must be called from
    /// within a tokio runtime.
    pub fn submit(&self, request: LoginRequest) -> TaskId {
        let id = TaskId::new(request.account());
        let run = self.registry.create(id.clone(), Utc::now());
        metrics::record_submitted();
        debug!(task_id = %id, "task registered");

        let registry = Arc::clone(&self.registry);
        let factory = Arc::clone(&self.factory);
        let settings = Arc::clone(&self.settings);
        let task_id = id.clone();
        self.tracker.spawn(async move {
            let worker = tokio::spawn(async move {
                run_login(factory.as_ref(), &request, &settings).await
            });
            let result = worker.await.unwrap_or_else(|err| Err(internal_failure(err)));
            record_outcome(&registry, &task_id, run, result);
        });
        id
    }

    /// Runs the flow inline and returns its result without touching the registry.
    pub async fn run_now(&self, request: LoginRequest) -> Result<String, FlowError> {
        run_login(self.factory.as_ref(), &request, &self.settings).await
    }

    /// Waits up to `grace` for in-flight tasks. Returns `false` if some were still
    /// running when the grace period ended.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "waiting for in-flight login tasks");
        }
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    pending = self.tracker.len(),
                    "login tasks still running after shutdown grace period"
                );
                false
            }
        }
    }
}

fn record_outcome(
    registry: &TaskRegistry,
    id: &TaskId,
    run: RunId,
    result: Result<String, FlowError>,
) {
    let outcome = match result {
        Ok(token) => {
            metrics::record_completed();
            TaskOutcome::Completed { token }
        }
        Err(err) => {
            metrics::record_failed(err.kind());
            TaskOutcome::Failed {
                error: err.to_string(),
            }
        }
    };
    let status = outcome.status();
    if registry.update(id, run, outcome) {
        info!(task_id = %id, %status, "task finished");
    }
    let evicted = registry.evict_expired(Utc::now());
    if evicted > 0 {
        debug!(evicted, "evicted expired tasks");
    }
}

fn internal_failure(err: JoinError) -> FlowError {
    if err.is_cancelled() {
        return FlowError::Internal("worker cancelled".into());
    }
    let payload = err.into_panic();
    let reason = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    };
    FlowError::Internal(format!("worker panicked: {reason}"))
}
