//! Prometheus metrics for the detection service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Metrics collector for the MEV Sentry service.
///
/// Every instance owns its registry, so several collectors can live in one
/// process (tests, embedded use).
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    classifications: IntCounter,
    verdicts: IntCounterVec,
    oracle_requests: IntCounter,
    oracle_errors: IntCounter,
    oracle_latency: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let classifications = IntCounter::new(
            "mev_sentry_classifications_total",
            "Total number of traces classified",
        )?;
        registry.register(Box::new(classifications.clone()))?;

        let verdicts = IntCounterVec::new(
            Opts::new(
                "mev_sentry_verdicts_total",
                "Verdicts by the rule that decided them",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(verdicts.clone()))?;

        let oracle_requests = IntCounter::new(
            "mev_sentry_oracle_requests_total",
            "Total number of contract verification lookups",
        )?;
        registry.register(Box::new(oracle_requests.clone()))?;

        let oracle_errors = IntCounter::new(
            "mev_sentry_oracle_errors_total",
            "Total number of failed contract verification lookups",
        )?;
        registry.register(Box::new(oracle_errors.clone()))?;

        let oracle_latency = HistogramVec::new(
            HistogramOpts::new(
                "mev_sentry_oracle_latency_seconds",
                "Contract verification lookup latency in seconds",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(oracle_latency.clone()))?;

        Ok(Self {
            registry,
            classifications,
            verdicts,
            oracle_requests,
            oracle_errors,
            oracle_latency,
        })
    }

    /// Record one finished classification and the rule that decided it.
    pub fn record_verdict(&self, reason: &str) {
        self.classifications.inc();
        self.verdicts.with_label_values(&[reason]).inc();
    }

    /// Increment the oracle request counter.
    pub fn inc_oracle_requests(&self) {
        self.oracle_requests.inc();
    }

    /// Increment the oracle error counter.
    pub fn inc_oracle_errors(&self) {
        self.oracle_errors.inc();
    }

    /// Record oracle latency.
    pub fn observe_oracle_latency(&self, operation: &str, duration_secs: f64) {
        self.oracle_latency
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Get Prometheus metrics as a string.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
