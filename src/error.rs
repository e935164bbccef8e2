//! Error types for XIRR calculations

use thiserror::Error;

/// Result alias used throughout the crate
pub type XirrResult<T> = Result<T, XirrError>;

/// Failures raised while validating a cash flow series or solving for its rate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XirrError {
    /// Malformed input: length mismatch, too few flows, one-signed flows,
    /// every flow on the same date, or non-finite values
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A rate at or below -100% where `(1 + rate)` is not positive
    #[error("Rate {rate} is outside the valid domain (rate must be > -1)")]
    Domain { rate: f64 },

    /// Iteration cap reached without meeting the NPV tolerance
    #[error("No convergence after {iterations} iterations (last rate: {rate}, residual: {residual})")]
    Convergence {
        iterations: usize,
        rate: f64,
        residual: f64,
    },

    /// No sign change of the NPV inside the bracket search range
    #[error("No root found: NPV does not change sign between {lower} and {upper}")]
    NoRootFound { lower: f64, upper: f64 },

    /// A date that could not be parsed or converted at the input boundary
    #[error("Invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    /// CSV input could not be read
    #[error("CSV error: {0}")]
    Csv(String),
}

impl XirrError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_date(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDate {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for XirrError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}
