use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounterVec, IntGauge, Registry};
use tracing::error;

lazy_static! {
    static ref TASKS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "tokenrelay_tasks_total",
            "Login tasks grouped by lifecycle event"
        ),
        &["event"]
    )
    .unwrap();
    static ref TASK_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "tokenrelay_task_failures_total",
            "Failed login tasks grouped by failure kind"
        ),
        &["kind"]
    )
    .unwrap();
    static ref TASKS_IN_FLIGHT: IntGauge = IntGauge::new(
        "tokenrelay_tasks_in_flight",
        "Login tasks currently running"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register scheduler metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, TASKS_TOTAL.clone());
    register(registry, TASK_FAILURES_TOTAL.clone());
    register(registry, TASKS_IN_FLIGHT.clone());
}

pub fn record_submitted() {
    TASKS_TOTAL.with_label_values(&["submitted"]).inc();
    TASKS_IN_FLIGHT.inc();
}

pub fn record_completed() {
    TASKS_TOTAL.with_label_values(&["completed"]).inc();
    TASKS_IN_FLIGHT.dec();
}

pub fn record_failed(kind: &str) {
    TASKS_TOTAL.with_label_values(&["failed"]).inc();
    TASK_FAILURES_TOTAL.with_label_values(&[kind]).inc();
    TASKS_IN_FLIGHT.dec();
}
