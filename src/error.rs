// src/error.rs
use thiserror::Error;

/// Error types for the mc-pricer library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricerError {
    /// Invalid model or option parameter (non-positive spot, strike, volatility, maturity)
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    Domain {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Control variate whose sample variance is numerically zero
    #[error("Degenerate control variate: sample variance {variance:e} is numerically zero")]
    DegenerateControl { variance: f64 },

    /// Invalid sample size, draw length or bump size
    #[error("Invalid value for '{field}': {reason}")]
    Value { field: String, reason: String },

    /// Estimator produced a non-finite or otherwise unusable result
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },
}

/// Coarse classification of a [`PricerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Domain,
    Value,
    Numerical,
}

impl PricerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricerError::Domain { .. } | PricerError::DegenerateControl { .. } => {
                ErrorKind::Domain
            }
            PricerError::Value { .. } => ErrorKind::Value,
            PricerError::NumericalInstability { .. } => ErrorKind::Numerical,
        }
    }

    pub fn is_domain(&self) -> bool {
        self.kind() == ErrorKind::Domain
    }

    pub fn is_value(&self) -> bool {
        self.kind() == ErrorKind::Value
    }

    pub(crate) fn value(field: &str, reason: impl Into<String>) -> Self {
        PricerError::Value {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for mc-pricer operations
pub type PricerResult<T> = Result<T, PricerError>;

/// Validation utilities
pub mod validation {
    use super::{PricerError, PricerResult};

    /// Validate that a model parameter is finite and strictly positive
    pub fn validate_positive(name: &str, value: f64) -> PricerResult<()> {
        if !(value > 0.0) || !value.is_finite() {
            Err(PricerError::Domain {
                parameter: name.to_string(),
                value,
                constraint: "must be finite and positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a model parameter is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> PricerResult<()> {
        if !value.is_finite() {
            Err(PricerError::Domain {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate paths count
    pub fn validate_paths(paths: usize) -> PricerResult<()> {
        if paths == 0 {
            Err(PricerError::value("n_paths", "must be greater than 0"))
        } else if paths > 1_000_000_000 {
            Err(PricerError::value(
                "n_paths",
                "exceeds maximum allowed (1 billion)",
            ))
        } else {
            Ok(())
        }
    }

    /// Validate a finite-difference bump size
    pub fn validate_bump(name: &str, bump: f64) -> PricerResult<()> {
        if !bump.is_finite() {
            Err(PricerError::value(name, format!("must be finite, got {}", bump)))
        } else if bump <= 0.0 {
            Err(PricerError::value(
                name,
                format!("must be strictly positive, got {}", bump),
            ))
        } else {
            Ok(())
        }
    }

    /// Validate that two co-indexed sequences have the same length
    pub fn validate_same_len(name: &str, expected: usize, actual: usize) -> PricerResult<()> {
        if expected != actual {
            Err(PricerError::value(
                name,
                format!("length mismatch: expected {}, got {}", expected, actual),
            ))
        } else {
            Ok(())
        }
    }
}
