//! Error types for parsing, projection and data loading

use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed or unrecognized frequency/duration input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("frequency string is empty")]
    EmptyFrequency,

    #[error("could not parse frequency: {0}")]
    UnrecognizedFrequency(String),

    #[error("start age cannot be greater than end age")]
    InvalidAgeRange { start: Decimal, end: Decimal },

    #[error("interval must be greater than zero: {0}")]
    ZeroInterval(String),

    #[error("age arithmetic exceeds representable range")]
    Overflow,
}

/// Failure projecting a single-window item
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("failed to parse frequency: {0}")]
    Frequency(#[source] ParseError),

    #[error("failed to parse duration: {0}")]
    Duration(#[source] ParseError),

    #[error("cost exceeds representable range")]
    Overflow,
}

impl CalculationError {
    /// Wrap a duration failure; age arithmetic overflow is reported as `Overflow`
    pub(crate) fn duration(error: ParseError) -> Self {
        match error {
            ParseError::Overflow => CalculationError::Overflow,
            other => CalculationError::Duration(other),
        }
    }
}

/// Failure reading reference data or plan files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid decimal '{value}': {source}")]
    Decimal {
        value: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("invalid record: {0}")]
    Invalid(String),
}
