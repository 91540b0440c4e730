//! ## lastbalans-cli
//! **Positional-argument front end for the queueing simulator**
//!
//! Usage:
//! `lastbalans T N prob[0..N-1] lambda queue_sizes[0..N-1] rates[0..N-1]`
//!
//! Prints the five run statistics space separated to stdout: served
//! count, dropped count, time the last request was handled, mean waiting
//! time, mean sojourn time. Exit code is 0 on success and non-zero on
//! malformed arguments.
//!
//! ### Expectations:
//! - POSIX-compliant argument parsing
//! - All diagnostics on stderr; stdout carries only the statistics line

use clap::Parser;

use lastbalans_telemetry::logging::EventLogger;
use lastbalans_telemetry::metrics::MetricsRecorder;

mod commands;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    EventLogger::init();
    let cli = Cli::parse();
    commands::run(cli, MetricsRecorder::new())
}
