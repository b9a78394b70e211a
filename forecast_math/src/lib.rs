//! # Forecast Math
//!
//! Numeric building blocks shared by the forecasting pipeline.
//! This crate provides ordinary least squares with the inverse Gram matrix
//! needed for prediction intervals, a simple linear regression over an
//! evenly spaced index, and summary statistics.

use thiserror::Error;

pub mod regression;
pub mod statistics;

pub use regression::{least_squares, LeastSquares, LinearRegression};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
