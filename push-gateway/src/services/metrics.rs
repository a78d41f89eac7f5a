//! Metrics collection for push-gateway.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    });
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_dispatch(status: &'static str) {
    metrics::counter!("push_dispatch_total", "status" => status).increment(1);
}

pub fn record_provider_call(provider: &'static str, status: &'static str) {
    metrics::counter!("push_provider_calls_total", "provider" => provider, "status" => status)
        .increment(1);
}
