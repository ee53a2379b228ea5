//! # Internal Metrics
//!
//! Registers descriptions for the metrics emitted by the surf check and
//! installs the Prometheus recorder that backs the `/metrics` endpoint.
//! When no recorder is installed the `metrics` macros are no-ops.

use anyhow::{Context, Result};
use metrics::Unit;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Registers descriptions for all supported metrics with the global recorder.
pub fn describe_metrics() {
    metrics::describe_counter!("surf_cycles_total", Unit::Count, "Total number of surf check cycles started.");
    metrics::describe_counter!("surf_locations_evaluated_total", Unit::Count, "Locations evaluated per cycle, labeled by fetch outcome.");
    metrics::describe_counter!("surf_locations_qualifying_total", Unit::Count, "Total number of location verdicts that qualified as good surf.");
    metrics::describe_counter!("surf_notifications_total", Unit::Count, "Dispatch attempts, labeled by delivery status.");
    metrics::describe_counter!("surf_push_tokens_total", Unit::Count, "Per-token push outcomes as reported by the transport.");
    metrics::describe_histogram!("surf_cycle_duration_seconds", Unit::Seconds, "Wall-clock duration of a full surf check cycle.");
}

/// Installs the Prometheus recorder globally and returns a handle for rendering.
///
/// Fails if another recorder has already been installed in this process.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    let recorder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
        )
        .context("invalid histogram buckets")?
        .build_recorder();
    let handle = recorder.handle();

    metrics::set_global_recorder(recorder)
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    describe_metrics();
    Ok(handle)
}
