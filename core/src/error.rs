use crate::types::Month;
use thiserror::Error;

/// A Parameter Set that fails validation. Always fatal, always raised
/// before any trial runs, never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min:   f64,
        max:   f64,
    },

    #[error("{field} must be finite and >= 0, got {value}")]
    Negative { field: String, value: f64 },

    #[error("{field} must be at least 1")]
    NotPositive { field: String },

    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("duplicate {field} '{name}'")]
    Duplicate { field: String, name: String },

    #[error("{field} refers to unknown station type '{station_type}'")]
    UnknownStation { field: String, station_type: String },

    #[error("{field} refers to unknown archetype '{archetype}'")]
    UnknownArchetype { field: String, archetype: String },

    #[error("{field} must have exactly {expected} entries, got {actual}")]
    WrongLength {
        field:    String,
        expected: usize,
        actual:   usize,
    },

    #[error("{field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// A numerical failure inside a single trial. Caught at the trial
/// boundary; the orchestrator counts it and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrialError {
    #[error("non-finite {field} at month {month}")]
    NonFinite { month: Month, field: &'static str },

    #[error("count overflow in {field} at month {month}")]
    Overflow { month: Month, field: &'static str },
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Scenario '{name}' not found")]
    ScenarioNotFound { name: String },

    #[error("Run '{run_id}' not found")]
    RunNotFound { run_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
