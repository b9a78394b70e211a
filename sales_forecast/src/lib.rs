//! # Sales Forecast
//!
//! A Rust library for monthly retail sales forecasting.
//!
//! ## Features
//!
//! - Loading arbitrary sales tables and mapping them onto `{date, amount, category}`
//! - Monthly aggregation with zero-filled gaps
//! - Additive MSTL decomposition (trend, seasonal, residual)
//! - Forecasting models (Seasonal Regression, MSTL + AutoETS, Seasonal Naive)
//!   with uncertainty bounds and optional holiday/promotion regressors
//! - Chronological holdout evaluation (MAE, RMSE, MAPE, R²)
//! - Report assembly with JSON and CSV export
//!
//! ## Pipeline
//!
//! The stages run in a fixed order and stop at the first error:
//!
//! ```text
//! DataFrame -> Normalizer -> Decomposer -> Evaluator -> Forecaster -> ForecastReport
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use sales_forecast::period::MonthPeriod;
//! use sales_forecast::synthetic::SyntheticSales;
//! use sales_forecast::{PipelineConfig, SalesPipeline};
//!
//! # fn main() -> sales_forecast::error::Result<()> {
//! // Four years of monthly sales
//! let data = SyntheticSales::new(MonthPeriod::new(2020, 1)?, 48)
//!     .noise(200.0)
//!     .dataframe()?;
//!
//! // Default configuration: MSTL + AutoETS, 6 month horizon, 6 month holdout
//! let pipeline = SalesPipeline::new(PipelineConfig::default())?;
//! let report = pipeline.run(&data)?;
//!
//! assert_eq!(report.forecast.points.len(), 6);
//! println!("{}", report.evaluation.metrics);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod decomposition;
pub mod error;
pub mod evaluation;
pub mod events;
pub mod forecaster;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod period;
pub mod pipeline;
pub mod report;
pub mod series;
pub mod synthetic;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{DataLoader, NormalizedSales, Normalizer};
pub use crate::decomposition::{DecompositionResult, Decomposer};
pub use crate::error::{ForecastError, Stage};
pub use crate::evaluation::{Evaluation, Evaluator};
pub use crate::events::EventCalendar;
pub use crate::forecaster::{ForecastOutcome, Forecaster};
pub use crate::metrics::EvaluationMetrics;
pub use crate::models::{FittedModel, ForecastModel, ForecastPoint, ModelConfig};
pub use crate::period::MonthPeriod;
pub use crate::pipeline::SalesPipeline;
pub use crate::report::{ExecutiveSummary, ForecastReport};
pub use crate::series::{MonthlyObservation, MonthlySeries};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
