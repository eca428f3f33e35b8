//! Error types for field construction and configuration

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("radius range must be positive and ordered")]
    RadiusRange,
    #[error("opacity range must lie in [0, 1] and be ordered")]
    OpacityRange,
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}

/// Errors that can occur when building a particle field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("requested {requested} particles but capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    #[error("particle {index} has a non-positive radius, opacity outside [0, 1] or a non-finite value")]
    InvalidParticle { index: usize },
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
}
