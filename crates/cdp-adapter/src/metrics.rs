use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, histogram_opts, Histogram, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref BROWSER_LAUNCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "tokenrelay_browser_launches_total",
            "Browser launches grouped by result"
        ),
        &["result"]
    )
    .unwrap();
    static ref PAGE_LOAD_DURATION: Histogram = Histogram::with_opts(histogram_opts!(
        "tokenrelay_page_load_duration_seconds",
        "Time from browser launch to a loaded login page",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]
    ))
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register cdp adapter metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, BROWSER_LAUNCHES_TOTAL.clone());
    register(registry, PAGE_LOAD_DURATION.clone());
}

pub fn record_launch(result: &str) {
    BROWSER_LAUNCHES_TOTAL.with_label_values(&[result]).inc();
}

pub fn observe_page_load(elapsed: Duration) {
    PAGE_LOAD_DURATION.observe(elapsed.as_secs_f64());
}
