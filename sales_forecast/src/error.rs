//! Error types for the sales_forecast crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalizer,
    Decomposer,
    Forecaster,
    Evaluator,
    ReportAssembler,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normalizer => "Normalizer",
            Stage::Decomposer => "Decomposer",
            Stage::Forecaster => "Forecaster",
            Stage::Evaluator => "Evaluator",
            Stage::ReportAssembler => "Report Assembler",
        };
        f.write_str(name)
    }
}

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No usable date or value column could be resolved
    #[error("{stage} schema error: {message}")]
    SchemaError { stage: Stage, message: String },

    /// History shorter than a stage requires
    #[error("{stage} insufficient data: {message}")]
    InsufficientDataError { stage: Stage, message: String },

    /// Non-finite or negative values where a non-negative quantity is required
    #[error("{stage} numeric error: {message}")]
    NumericError { stage: Stage, message: String },

    /// Error from invalid parameters or configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from numeric primitives
    #[error("Math error: {0}")]
    MathError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error reading configuration or writing the JSON report
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    pub fn schema(stage: Stage, message: impl Into<String>) -> Self {
        ForecastError::SchemaError {
            stage,
            message: message.into(),
        }
    }

    pub fn insufficient(stage: Stage, message: impl Into<String>) -> Self {
        ForecastError::InsufficientDataError {
            stage,
            message: message.into(),
        }
    }

    pub fn numeric(stage: Stage, message: impl Into<String>) -> Self {
        ForecastError::NumericError {
            stage,
            message: message.into(),
        }
    }

    /// Attribute a numeric-primitive failure to a pipeline stage
    pub fn from_math(stage: Stage, err: MathError) -> Self {
        match err {
            MathError::InsufficientData(message) => Self::insufficient(stage, message),
            MathError::InvalidInput(message) | MathError::CalculationError(message) => {
                Self::numeric(stage, message)
            }
        }
    }

    /// The stage that failed, for the error kinds that carry one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ForecastError::SchemaError { stage, .. }
            | ForecastError::InsufficientDataError { stage, .. }
            | ForecastError::NumericError { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        ForecastError::MathError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
