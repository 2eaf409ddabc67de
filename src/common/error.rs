//! Error types for lsm-bench

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    // === Engine Errors ===
    #[error("{op} failed: {source}")]
    Engine {
        op: &'static str,
        source: rocksdb::Error,
    },

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),

    // === Measurement Errors ===
    #[error("Failed to get {0}")]
    PropertyUnavailable(String),

    #[error("Measurement anomaly: {0}")]
    Measurement(String),
}

/// Coarse error taxonomy used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    EngineOperation,
    Measurement,
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::EngineOperation => write!(f, "engine"),
            ErrorCategory::Measurement => write!(f, "measurement"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

impl Error {
    /// Wrap an engine error with the name of the failing operation.
    ///
    /// Meant for `map_err`: `db.put(k, v).map_err(Error::engine("Put"))`.
    pub fn engine(op: &'static str) -> impl FnOnce(rocksdb::Error) -> Error {
        move |source| Error::Engine { op, source }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig(_) | Error::Config(_) => ErrorCategory::Configuration,
            Error::Engine { .. } | Error::NotFound(_) | Error::WorkerPanicked(_) => {
                ErrorCategory::EngineOperation
            }
            Error::PropertyUnavailable(_) | Error::Measurement(_) => ErrorCategory::Measurement,
            Error::Io(_) => ErrorCategory::Io,
        }
    }
}
