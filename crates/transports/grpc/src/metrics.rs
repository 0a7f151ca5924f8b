//! Prometheus metrics for the inference client
//!
//! Tracks Predict calls by outcome and their round-trip latency.

use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Prometheus metrics for Predict calls
#[derive(Clone)]
pub struct ClientMetrics {
    /// Total Predict calls (labeled by status: "success" or "failure")
    pub requests_total: IntCounterVec,

    /// Predict round-trip latency in seconds
    pub request_duration_seconds: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl ClientMetrics {
    /// Create new metrics with a custom registry
    pub fn new(registry: Registry) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "tfserving_predict_requests_total",
                "Total number of Predict calls issued",
            ),
            &["status"],
        )?;

        let request_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "tfserving_predict_duration_seconds",
                "Predict round-trip latency distribution in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, // 5ms .. 50ms
                0.1, 0.25, 0.5, 1.0, // 100ms .. 1s
                2.0, 3.0, // up to the default RPC timeout
            ]),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            registry: Arc::new(registry),
        })
    }

    /// Create with default registry
    pub fn with_default_registry() -> Result<Self, prometheus::Error> {
        Self::new(Registry::new())
    }

    /// Record a completed Predict call
    pub fn record_success(&self, elapsed: Duration) {
        self.requests_total.with_label_values(&["success"]).inc();
        self.request_duration_seconds.observe(elapsed.as_secs_f64());
    }

    /// Record a Predict call that failed or timed out
    pub fn record_failure(&self, elapsed: Duration) {
        self.requests_total.with_label_values(&["failure"]).inc();
        self.request_duration_seconds.observe(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::with_default_registry();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_request_metrics() {
        let metrics = ClientMetrics::with_default_registry().unwrap();

        metrics.record_success(Duration::from_millis(12));
        metrics.record_success(Duration::from_millis(30));
        metrics.record_failure(Duration::from_secs(3));

        assert_eq!(
            metrics.requests_total.with_label_values(&["success"]).get(),
            2
        );
        assert_eq!(
            metrics.requests_total.with_label_values(&["failure"]).get(),
            1
        );
        assert_eq!(metrics.request_duration_seconds.get_sample_count(), 3);
    }

    #[test]
    fn test_metrics_are_registered() {
        let metrics = ClientMetrics::with_default_registry().unwrap();
        metrics.record_success(Duration::from_millis(1));

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"tfserving_predict_requests_total".to_string()));
        assert!(names.contains(&"tfserving_predict_duration_seconds".to_string()));
    }
}
