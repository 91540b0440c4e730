use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation parameters: {0}")]
    Config(String),

    #[error("routing distribution rejected: {0}")]
    Routing(#[from] rand::distr::weighted::Error),

    #[error("service-time distribution rejected: {0}")]
    ServiceTime(#[from] rand_distr::ExpError),
}
