//! Prometheus metrics for stream workers
//!
//! Provides observability into worker throughput and outcomes.

use crate::delivery::Disposition;
use crate::error::StreamError;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

static PROMETHEUS_LISTENER: OnceCell<SocketAddr> = OnceCell::new();

/// Initialize the Prometheus exporter with an HTTP scrape listener
///
/// Call this once at startup from within a tokio runtime. Subsequent calls are
/// no-ops.
pub fn init_metrics(listener: SocketAddr) -> Result<(), StreamError> {
    if PROMETHEUS_LISTENER.get().is_some() {
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(listener)
        .install()
        .map_err(|e| StreamError::Config(format!("Failed to install Prometheus exporter: {e}")))?;

    let _ = PROMETHEUS_LISTENER.set(listener);
    info!(%listener, "Prometheus metrics initialized");
    Ok(())
}

/// Stream worker metrics helper
#[derive(Clone)]
pub struct StreamMetrics {
    /// Stream name for labeling
    stream_name: String,
    /// Handler name for labeling
    handler_name: String,
}

impl StreamMetrics {
    /// Create new StreamMetrics
    pub fn new(stream_name: impl Into<String>, handler_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            handler_name: handler_name.into(),
        }
    }

    /// Record a delivery being received
    pub fn delivery_received(&self) {
        counter!(
            "stream_worker_deliveries_received_total",
            "stream" => self.stream_name.clone(),
            "handler" => self.handler_name.clone()
        )
        .increment(1);
    }

    /// Record how a delivery was settled
    pub fn delivery_settled(&self, disposition: Disposition, duration: Duration) {
        counter!(
            "stream_worker_deliveries_settled_total",
            "stream" => self.stream_name.clone(),
            "handler" => self.handler_name.clone(),
            "disposition" => disposition.label()
        )
        .increment(1);

        histogram!(
            "stream_worker_delivery_duration_seconds",
            "stream" => self.stream_name.clone(),
            "handler" => self.handler_name.clone()
        )
        .record(duration.as_secs_f64());
    }

    /// Record a settlement that could not be applied to the source
    pub fn settle_failed(&self) {
        counter!(
            "stream_worker_settle_errors_total",
            "stream" => self.stream_name.clone(),
            "handler" => self.handler_name.clone()
        )
        .increment(1);
    }
}
