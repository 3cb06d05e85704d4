use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use cdp_adapter::metrics as cdp_metrics;
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{Encoder, Registry, TextEncoder};
use tokenrelay_scheduler::metrics as scheduler_metrics;
use tracing::error;

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        let registry = global_registry();
        scheduler_metrics::register_metrics(registry);
        cdp_metrics::register_metrics(registry);
    });
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

/// Renders every registered metric in the Prometheus text format.
pub fn render() -> Response {
    register_metrics();
    let encoder = TextEncoder::new();
    let metric_families = global_registry().gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(?err, "failed to encode prometheus metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response();
    }

    match HeaderValue::from_str(encoder.format_type()) {
        Ok(content_type) => ([(header::CONTENT_TYPE, content_type)], buffer).into_response(),
        Err(err) => {
            error!(?err, "failed to build content-type header");
            (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response()
        }
    }
}
