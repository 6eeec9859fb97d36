//! # Prometheus Metrics
//!
//! Operational metrics for `sealchain-node serve`, scraped at `/metrics` on
//! the metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] with the
//! `sealchain` prefix so they never collide with the default global registry.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Handles for every metric the node records.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Records accepted by `append`.
    pub records_appended_total: IntCounter,
    /// Appends refused (sealed chain or oversized payload).
    pub appends_rejected_total: IntCounter,
    /// Integrity walks performed.
    pub verifications_total: IntCounter,
    /// Integrity walks that found a bad record.
    pub integrity_failures_total: IntCounter,
    /// Current number of records, genesis included.
    pub chain_length: IntGauge,
    /// 1 once the chain is sealed, 0 before.
    pub chain_sealed: IntGauge,
    /// Time spent in a full integrity walk.
    pub verify_duration_seconds: Histogram,
}

impl NodeMetrics {
    /// Create and register all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("sealchain".into()), None)?;

        let records_appended_total = IntCounter::new(
            "records_appended_total",
            "Total number of records appended to the chain",
        )?;
        registry.register(Box::new(records_appended_total.clone()))?;

        let appends_rejected_total = IntCounter::new(
            "appends_rejected_total",
            "Total number of append requests the chain refused",
        )?;
        registry.register(Box::new(appends_rejected_total.clone()))?;

        let verifications_total = IntCounter::new(
            "verifications_total",
            "Total number of full integrity verifications",
        )?;
        registry.register(Box::new(verifications_total.clone()))?;

        let integrity_failures_total = IntCounter::new(
            "integrity_failures_total",
            "Total number of verifications that reported an invalid chain",
        )?;
        registry.register(Box::new(integrity_failures_total.clone()))?;

        let chain_length = IntGauge::new("chain_length", "Number of records in the chain")?;
        registry.register(Box::new(chain_length.clone()))?;

        let chain_sealed = IntGauge::new("chain_sealed", "1 if the chain is sealed, else 0")?;
        registry.register(Box::new(chain_sealed.clone()))?;

        let verify_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "verify_duration_seconds",
                "Duration of a full integrity verification in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
            ]),
        )?;
        registry.register(Box::new(verify_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            records_appended_total,
            appends_rejected_total,
            verifications_total,
            integrity_failures_total,
            chain_length,
            chain_sealed,
            verify_duration_seconds,
        })
    }

    /// Refresh the chain gauges.
    pub fn observe_chain(&self, length: usize, sealed: bool) {
        self.chain_length.set(length as i64);
        self.chain_sealed.set(i64::from(sealed));
    }

    /// Encode all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_prefixed_metric_names() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.records_appended_total.inc();
        metrics.observe_chain(3, true);

        let text = metrics.encode().unwrap();
        assert!(text.contains("sealchain_records_appended_total 1"));
        assert!(text.contains("sealchain_chain_length 3"));
        assert!(text.contains("sealchain_chain_sealed 1"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.verifications_total.inc();
        assert!(b.encode().unwrap().contains("sealchain_verifications_total 0"));
    }
}
