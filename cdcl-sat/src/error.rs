//! Error types returned by the solver and its configuration loader.
use thiserror::Error;

/// Errors that can occur while configuring or driving the solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("unknown configuration key: {0}")]
    UnknownConfigKey(String),

    #[error("invalid value {value:?} for configuration key {key}: {reason}")]
    InvalidConfigValue {
        key: String,
        value: String,
        reason: String,
    },
}
