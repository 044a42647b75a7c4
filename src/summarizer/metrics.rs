//! Metrics for summary requests
//!
//! # Metrics
//!
//! - `summaries_total`: Counter of summary requests by outcome
//! - `summary_duration_seconds`: Histogram of end-to-end summary latency
//! - `summary_llm_attempts_total`: Counter of provider calls by result
//!
//! # Examples
//!
//! ```
//! use chatsum::summarizer::metrics::SummaryMetrics;
//!
//! let metrics = SummaryMetrics::new("ollama");
//! metrics.record_attempt("ok");
//! metrics.record_outcome("digest");
//! ```

use metrics::{histogram, increment_counter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Metrics collection for a single summary request
#[derive(Debug)]
pub struct SummaryMetrics {
    provider: String,
    start: Instant,
    recorded: AtomicBool,
}

impl SummaryMetrics {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            start: Instant::now(),
            recorded: AtomicBool::new(false),
        }
    }

    /// Count one provider call; `result` is `ok`, `timeout`, `error` or `empty`
    pub fn record_attempt(&self, result: &str) {
        increment_counter!(
            "summary_llm_attempts_total",
            "provider" => self.provider.clone(),
            "result" => result.to_string()
        );
    }

    /// Record how the request ended; only the first call counts
    pub fn record_outcome(&self, outcome: &str) {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return;
        }

        histogram!(
            "summary_duration_seconds",
            self.start.elapsed().as_secs_f64(),
            "outcome" => outcome.to_string()
        );
        increment_counter!("summaries_total", "outcome" => outcome.to_string());
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

/// Installs the Prometheus exporter when built with the `prometheus` feature
///
/// A no-op otherwise.
pub fn init_metrics_exporter() {
    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        if let Err(e) = PrometheusBuilder::new().install() {
            tracing::warn!("Failed to install Prometheus exporter: {}", e);
        }
    }
}
