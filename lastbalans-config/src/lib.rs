//! # Lastbalans Configuration
//!
//! Typed configuration for the queueing simulator.
//!
//! ## Features
//! - **Validation**: every parameter set is checked before a run starts,
//!   so malformed input never reaches the kernel
//! - **File and environment loading**: YAML via figment, with
//!   `LASTBALANS_*` environment overrides
//! - **Serde throughout**: the same struct round-trips through files and
//!   the CLI adapter

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod error;
mod simulation;
mod validation;

pub use error::ConfigError;
pub use simulation::SimulationConfig;
