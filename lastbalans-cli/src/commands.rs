use anyhow::Context;
use clap::Parser;
use rand::Rng;
use tracing::debug;

use lastbalans_config::SimulationConfig;
use lastbalans_telemetry::logging::EventLogger;
use lastbalans_telemetry::metrics::MetricsRecorder;

#[derive(Parser, Debug)]
#[command(version, about = "Discrete-event simulator of a probabilistic load balancer")]
pub struct Cli {
    /// Simulation horizon T; the arrival generator stops once reached.
    #[arg(allow_negative_numbers = true)]
    pub horizon: f64,

    /// Number of servers N.
    pub servers: usize,

    /// prob[0..N-1] lambda queue_sizes[0..N-1] rates[0..N-1]
    #[arg(num_args = 1.., allow_negative_numbers = true)]
    pub values: Vec<f64>,
}

pub fn run(cli: Cli, metrics: MetricsRecorder) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    let report = lastbalans_core::run(&config)?;

    metrics.record_run(report.offered, report.served, report.dropped);
    EventLogger::log_run(report.served, report.dropped, report.last_completion);
    debug!(digest = %report.digest, "deterministic run digest");

    println!("{report}");
    Ok(())
}

/// Splits the flat positional tail into the three per-server sequences and
/// builds a validated configuration.
fn build_config(cli: &Cli) -> anyhow::Result<SimulationConfig> {
    let n = cli.servers;
    let expected = n
        .checked_mul(3)
        .and_then(|v| v.checked_add(1))
        .context("server count is too large")?;
    if cli.values.len() != expected {
        anyhow::bail!(
            "expected {expected} values after T and N \
             (prob[0..N-1] lambda queue_sizes[0..N-1] rates[0..N-1]), got {}",
            cli.values.len()
        );
    }

    let probabilities = cli.values[..n].to_vec();
    let arrival_rate = cli.values[n];
    let queue_sizes = cli.values[n + 1..2 * n + 1]
        .iter()
        .map(|&v| as_slot_count(v))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let service_rates = cli.values[2 * n + 1..].to_vec();

    let config = SimulationConfig {
        horizon: cli.horizon,
        servers: n,
        probabilities,
        arrival_rate,
        queue_sizes,
        service_rates,
        seed: seed_from_env()?,
    };
    config.validated().map_err(Into::into)
}

/// Queue sizes arrive as floats for compatibility with the classic
/// argument order; only integral values are meaningful slot counts.
fn as_slot_count(value: f64) -> anyhow::Result<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Ok(value as u64)
    } else {
        anyhow::bail!("queue size {value} is not a non-negative integer")
    }
}

/// `LASTBALANS_SEED` pins the run; without it every invocation draws a
/// fresh seed from OS entropy.
fn seed_from_env() -> anyhow::Result<u64> {
    match std::env::var("LASTBALANS_SEED") {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("LASTBALANS_SEED is not a u64: {raw}")),
        Err(_) => Ok(rand::rng().random()),
    }
}
