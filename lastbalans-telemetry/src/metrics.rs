//! ## lastbalans-telemetry::metrics
//! **Prometheus counters for simulator outcomes**
//!
//! One registry per process; each finished run folds its counts in. There
//! is no exporter endpoint; callers gather the text encoding themselves.

use prometheus::{Encoder, IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub arrivals_total: IntCounter,
    pub served_total: IntCounter,
    pub dropped_total: IntCounter,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let arrivals_total = IntCounter::new(
            "lastbalans_arrivals_total",
            "Arrivals routed by the dispatcher",
        )
        .unwrap();
        let served_total =
            IntCounter::new("lastbalans_served_total", "Units served to completion").unwrap();
        let dropped_total =
            IntCounter::new("lastbalans_dropped_total", "Units dropped at admission").unwrap();

        registry.register(Box::new(arrivals_total.clone())).unwrap();
        registry.register(Box::new(served_total.clone())).unwrap();
        registry.register(Box::new(dropped_total.clone())).unwrap();

        Self {
            registry,
            arrivals_total,
            served_total,
            dropped_total,
        }
    }

    /// Folds one finished run into the counters.
    pub fn record_run(&self, offered: u64, served: u64, dropped: u64) {
        self.arrivals_total.inc_by(offered);
        self.served_total.inc_by(served);
        self.dropped_total.inc_by(dropped);
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }
}
