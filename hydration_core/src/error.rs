//! Error types for the hydration_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hydration_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Intake amount was zero, negative or not a number
    #[error("Invalid amount: {0} ml (must be a positive number)")]
    InvalidAmount(f64),

    /// Daily goal was zero, negative or not a number
    #[error("Invalid goal: {0} ml (must be a positive number)")]
    InvalidGoal(f64),

    /// Body measurement rejected by the recommendation helpers
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    /// State could not be written to the backend
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
