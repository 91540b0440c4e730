//! Custom validation for simulation parameters.
//!
//! Cross-field rules (sequence lengths, probability mass, finiteness) live
//! here so the derive on `SimulationConfig` stays declarative.

use validator::ValidationError;

use crate::simulation::SimulationConfig;

/// Largest tolerated drift of the probability mass from 1.0.
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Schema-level validation: sequence shapes, finiteness, and the routing
/// distribution's probability mass.
pub fn validate_shape(config: &SimulationConfig) -> Result<(), ValidationError> {
    if config.probabilities.len() != config.servers
        || config.queue_sizes.len() != config.servers
        || config.service_rates.len() != config.servers
    {
        return Err(ValidationError::new("sequence_length_mismatch").with_message(
            "probabilities, queue_sizes and service_rates need one entry per server".into(),
        ));
    }
    if !config.horizon.is_finite() {
        return Err(ValidationError::new("horizon_not_finite"));
    }
    if !config.arrival_rate.is_finite() {
        return Err(ValidationError::new("arrival_rate_not_finite"));
    }
    validate_probabilities(&config.probabilities)?;
    validate_service_rates(&config.service_rates)?;
    Ok(())
}

/// Validate that the entries form a discrete probability distribution.
pub fn validate_probabilities(probabilities: &[f64]) -> Result<(), ValidationError> {
    if probabilities
        .iter()
        .any(|p| !p.is_finite() || *p < 0.0)
    {
        return Err(ValidationError::new("probability_out_of_range")
            .with_message("probabilities must be finite and non-negative".into()));
    }
    let mass: f64 = probabilities.iter().sum();
    if (mass - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(ValidationError::new("probability_mass")
            .with_message(format!("probabilities sum to {mass}, expected 1").into()));
    }
    Ok(())
}

/// Validate that every service rate is a finite positive number.
pub fn validate_service_rates(rates: &[f64]) -> Result<(), ValidationError> {
    if rates.iter().any(|r| !r.is_finite() || *r <= 0.0) {
        return Err(ValidationError::new("service_rate_out_of_range")
            .with_message("service rates must be finite and positive".into()));
    }
    Ok(())
}
