//! Core error types for cadence-core.
//!
//! The public surface is narrow: `evaluate` never returns an
//! error (gate failures fail open), and `record_outcome` only rejects
//! structurally invalid records. Everything else is configuration or I/O.

use std::path::PathBuf;
use thiserror::Error;

use crate::profile::DayPart;

/// Core error type for cadence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected outcome records
    #[error("Outcome error: {0}")]
    Outcome(#[from] OutcomeError),

    /// Content generation failures (raised by external generators)
    #[error("Content generation failed for {category}: {message}")]
    Content { category: String, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// A persona timing profile violates its invariants
    #[error("Invalid timing profile for persona '{persona}': {message}")]
    InvalidProfile { persona: String, message: String },

    /// Could not determine the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Structural problems with an `OutcomeRecord`.
///
/// Out-of-range numeric fields are clamped, not reported here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("outcome record has an empty user_id")]
    MissingUserId,

    #[error("outcome record has an empty persona")]
    MissingPersona,

    #[error("hour_of_day must be within 0-23, got {hour}")]
    InvalidHour { hour: u32 },
}

/// Internal gate failures. These never leave the engine: `evaluate` logs
/// them and permits the intervention.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("persona '{persona}' has a non-finite or non-positive {day_part} interval ({value})")]
    NonFiniteInterval {
        persona: String,
        day_part: DayPart,
        value: f64,
    },

    #[error("persona '{persona}' has unordered cognitive load thresholds")]
    InvalidThresholds { persona: String },

    #[error("persona '{persona}' has a non-finite flow protection window ({value})")]
    NonFiniteProtection { persona: String, value: f64 },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.into())
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        CoreError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_error_converts_into_core_error() {
        let err: CoreError = OutcomeError::InvalidHour { hour: 24 }.into();
        assert!(matches!(err, CoreError::Outcome(OutcomeError::InvalidHour { hour: 24 })));
        assert!(err.to_string().contains("0-23"));
    }

    #[test]
    fn toml_parse_error_becomes_config_error() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("= nope");
        let err: CoreError = parsed.unwrap_err().into();
        assert!(matches!(err, CoreError::Config(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn gate_error_names_day_part() {
        let err = GateError::NonFiniteInterval {
            persona: "manager".into(),
            day_part: DayPart::Morning,
            value: f64::NAN,
        };
        assert!(err.to_string().contains("morning"));
    }
}
