//! ## lastbalans-telemetry::logging
//! **Structured logging with tracing**
//!
//! The simulator writes its statistics contract to stdout; everything else
//! (phase transitions, drops, digests, run summaries) goes through
//! `tracing` so it can be filtered away entirely.

use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global fmt subscriber. `RUST_LOG` overrides the
    /// default `info` filter.
    pub fn init() {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .init()
    }

    /// Logs the end-of-run summary.
    pub fn log_run(served: u64, dropped: u64, last_completion: f64) {
        tracing::info!(served, dropped, last_completion, "run finished");
    }
}
