//! Prometheus metrics for the review services.
//!
//! Recording goes through the `metrics` facade, so it is a no-op until a
//! recorder is installed. The server installs one via [`MetricsServer`].
//!
//! # Example
//!
//! ```rust,no_run
//! use product_reviews_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! let exposition = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its exposition is served on.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the exposition endpoint should listen on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Install the Prometheus recorder and register metric descriptions.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    /// A recorder that is already installed is tolerated.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                register_metrics();
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format; `None` before `start`.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!("reviews_submitted_total", "Reviews successfully submitted");
    describe_counter!("reviews_updated_total", "Reviews successfully updated");
    describe_counter!("reviews_deleted_total", "Reviews successfully deleted");
    describe_counter!(
        "reviews_rejected_total",
        "Review mutations rejected, labelled by error kind"
    );
    describe_counter!("reviews_helpful_votes_total", "Helpful votes recorded");
    describe_counter!(
        "reviews_purchase_check_failures_total",
        "Purchase checks that failed or timed out and were treated as not purchased"
    );
    describe_counter!(
        "reviews_stale_aggregates_total",
        "Rating aggregates left stale after a committed review mutation"
    );
    describe_histogram!(
        "reviews_recompute_duration_seconds",
        "Time taken to recompute and write a product rating aggregate"
    );

    describe_counter!("retry_attempts_total", "Total number of retry attempts");
    describe_counter!("retry_successes_total", "Operations that succeeded after retrying");
    describe_counter!(
        "retry_exhausted_total",
        "Operations that failed after exhausting their retries"
    );

    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency by method and status"
    );
}

/// Review service metrics recorder.
pub struct ReviewMetrics;

impl ReviewMetrics {
    /// A review was created.
    pub fn record_submitted() {
        counter!("reviews_submitted_total").increment(1);
    }

    /// A review was edited.
    pub fn record_updated() {
        counter!("reviews_updated_total").increment(1);
    }

    /// A review was removed.
    pub fn record_deleted() {
        counter!("reviews_deleted_total").increment(1);
    }

    /// A mutation was refused with a client error.
    pub fn record_rejected(kind: &'static str) {
        counter!("reviews_rejected_total", "kind" => kind).increment(1);
    }

    /// A helpful vote was stored.
    pub fn record_helpful_vote() {
        counter!("reviews_helpful_votes_total").increment(1);
    }

    /// The order collaborator failed or timed out.
    pub fn record_purchase_check_failure() {
        counter!("reviews_purchase_check_failures_total").increment(1);
    }

    /// An aggregate could not be refreshed after a mutation.
    pub fn record_stale_aggregate() {
        counter!("reviews_stale_aggregates_total").increment(1);
    }

    /// Duration of one recompute.
    pub fn record_recompute(duration: Duration) {
        histogram!("reviews_recompute_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// A retry is about to happen.
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// An operation succeeded after at least one retry.
    pub fn record_success() {
        counter!("retry_successes_total").increment(1);
    }

    /// An operation ran out of retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }
}
