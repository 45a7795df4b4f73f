//! Acquisition metrics
//!
//! Counters are always recorded through the `metrics` facade; without an
//! installed recorder they cost next to nothing. Passing `--metrics-addr`
//! installs a Prometheus exporter with a scrape endpoint.

use crate::downloader::AcquisitionStatus;
use crate::ProductKind;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{debug, info};

/// Set once the exporter is installed
static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Metrics errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Install the Prometheus exporter on `addr`.
///
/// Idempotent: later calls are ignored. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(%existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "gnss_acquisitions_total",
        Unit::Count,
        "Acquisition outcomes by product kind and status"
    );
    describe_counter!(
        "gnss_transfer_attempts_total",
        Unit::Count,
        "Remote URLs handed to the transfer tool"
    );
    describe_histogram!(
        "gnss_acquisition_duration_seconds",
        Unit::Seconds,
        "Wall time of one acquisition"
    );
    describe_counter!(
        "gnss_stitches_total",
        Unit::Count,
        "Orbit/clock stitch attempts by result"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    Ok(())
}

/// Whether the exporter is installed
pub fn is_initialized() -> bool {
    METRICS_INITIALIZED.get().is_some()
}

/// Metrics for one acquisition
#[derive(Debug)]
pub struct AcquisitionMetrics {
    kind: ProductKind,
    start_time: Instant,
}

impl AcquisitionMetrics {
    /// Start timing an acquisition of `kind`
    pub fn start(kind: ProductKind) -> Self {
        Self {
            kind,
            start_time: Instant::now(),
        }
    }

    /// Count one URL handed to the transfer tool
    pub fn record_attempt(&self) {
        counter!("gnss_transfer_attempts_total", "kind" => self.kind.as_str()).increment(1);
    }

    /// Record the final status
    pub fn record_outcome(&self, status: AcquisitionStatus) {
        counter!(
            "gnss_acquisitions_total",
            "kind" => self.kind.as_str(),
            "status" => status.as_str(),
        )
        .increment(1);
        histogram!("gnss_acquisition_duration_seconds", "kind" => self.kind.as_str())
            .record(self.start_time.elapsed().as_secs_f64());
    }
}

/// Record a stitch attempt
pub fn record_stitch(merged: bool) {
    let result = if merged { "merged" } else { "skipped" };
    counter!("gnss_stitches_total", "result" => result).increment(1);
}
