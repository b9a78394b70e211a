//! # Retail Forecaster
//!
//! Workspace facade over the `sales_forecast` pipeline and the
//! `forecast_math` numeric primitives.
//!
//! ## Example
//!
//! ```
//! use retail_forecaster_workspace::prelude::*;
//!
//! let start = MonthPeriod::new(2021, 1).unwrap();
//! let series = SyntheticSales::new(start, 36).series().unwrap();
//! let decomposition = Decomposer::new().decompose(&series).unwrap();
//!
//! assert_eq!(decomposition.trend.len(), 36);
//! ```

pub use forecast_math;
pub use sales_forecast;

/// Commonly used types from both crates
pub mod prelude {
    pub use forecast_math::{least_squares, LinearRegression, MathError};
    pub use sales_forecast::synthetic::SyntheticSales;
    pub use sales_forecast::{
        DataLoader, Decomposer, EvaluationMetrics, Evaluator, EventCalendar, ForecastError,
        ForecastModel, ForecastPoint, ForecastReport, Forecaster, ModelConfig, MonthPeriod,
        MonthlySeries, Normalizer, PipelineConfig, SalesPipeline,
    };
}
