//! Error types for tenantscope-core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for the tenantscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Event or allocation snapshot breaks a load-time rule
    #[error("schema violation{}: {message}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    SchemaViolation { line: Option<u64>, message: String },

    /// Period whose start lies after its end
    #[error("invalid period: start {start} is after end {end}")]
    InvalidPeriod {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Period that reaches past the supported calendar
    #[error("period out of range: {0}")]
    PeriodOutOfRange(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a schema violation tied to a specific input line.
    pub fn schema_at(line: u64, message: impl Into<String>) -> Self {
        Error::SchemaViolation {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Build a schema violation that is not tied to one input line.
    pub fn schema(message: impl Into<String>) -> Self {
        Error::SchemaViolation {
            line: None,
            message: message.into(),
        }
    }
}

/// Result type alias for tenantscope-core
pub type Result<T> = std::result::Result<T, Error>;
