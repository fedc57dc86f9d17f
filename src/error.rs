//! Error types for the diagnosis engine.
//!
//! Degenerate numeric input (flat vectors, zero sums) is not an error; those
//! paths fall back deterministically. Errors are reserved for malformed input
//! and for configuration or reference data that cannot be used.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, OracleError>;

#[derive(Error, Debug)]
pub enum OracleError {
    /// Trait vector does not have exactly one value per trigram axis.
    #[error("expected {expected} trait values, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// NaN or infinite trait value.
    #[error("trait value for {axis} is not finite: {value}")]
    NonFinite { axis: String, value: f64 },

    /// Trait values are magnitudes and must not be negative.
    #[error("trait value for {axis} is negative: {value}")]
    NegativeValue { axis: String, value: f64 },

    /// Label that names none of the eight trigrams.
    #[error("unknown trigram label: {0:?}")]
    UnknownTrigram(String),

    #[error("hexagram id {0} is outside 1..=64")]
    InvalidHexagram(u8),

    #[error("line position {0} is outside 1..=6")]
    InvalidLinePosition(u8),

    /// Probability vector that is negative, non-finite or does not sum to 1.
    #[error("invalid energy distribution: {0}")]
    InvalidDistribution(String),

    #[error("softmax temperature must be finite and positive, got {0}")]
    InvalidTemperature(f64),

    #[error("invalid category profile: {0}")]
    InvalidProfile(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reference dataset could not be loaded or contains unusable records.
    #[error("reference data error: {0}")]
    Reference(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
