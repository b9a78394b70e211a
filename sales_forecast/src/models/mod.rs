//! Forecasting models for monthly sales
//!
//! Every backend exposes the same two-step capability set: [`ForecastModel::fit`]
//! on a history produces a [`FittedModel`], which then predicts any horizon
//! with its own native uncertainty bounds. The pipeline only sees these traits,
//! so backends can be swapped through [`ModelConfig`].

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::fmt::Debug;

use crate::error::{ForecastError, Result, Stage};
use crate::events::EventCalendar;
use crate::period::MonthPeriod;
use crate::series::MonthlySeries;

pub mod mstl;
pub mod seasonal_naive;
pub mod seasonal_regression;

pub use mstl::Mstl;
pub use seasonal_naive::SeasonalNaive;
pub use seasonal_regression::SeasonalRegression;

/// Default width of the uncertainty interval
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.80;

/// A forecast for one future month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: MonthPeriod,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    /// Point with a symmetric interval of half-width `margin`
    pub fn symmetric(period: MonthPeriod, point_estimate: f64, margin: f64) -> Self {
        let margin = margin.abs();
        Self {
            period,
            point_estimate,
            lower_bound: point_estimate - margin,
            upper_bound: point_estimate + margin,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.point_estimate.is_finite() && self.lower_bound.is_finite() && self.upper_bound.is_finite()
    }

    /// `lower_bound <= point_estimate <= upper_bound`
    pub fn is_ordered(&self) -> bool {
        self.lower_bound <= self.point_estimate && self.point_estimate <= self.upper_bound
    }
}

/// A model that can be fitted on a monthly history
pub trait ForecastModel: Debug + Send + Sync {
    /// Fit on `history`; `events` may also cover months after the history
    fn fit(&self, history: &MonthlySeries, events: &EventCalendar) -> Result<Box<dyn FittedModel>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// A fitted model, ready to predict the months after its history
pub trait FittedModel: Debug + Send + Sync {
    /// Forecast the `horizon` months following the fitted history
    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>>;

    /// In-sample predictions aligned with the history, `None` where the
    /// model has no prediction for a month
    fn fitted_values(&self) -> &[Option<f64>];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Serializable choice of forecasting backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    /// Linear trend + yearly Fourier terms + event regressors, fitted by OLS
    SeasonalRegression {
        #[serde(default = "default_fourier_order")]
        fourier_order: usize,
    },
    /// MSTL with a 12 month period and an AutoETS trend model
    Mstl,
    /// Repeat the last observed year
    SeasonalNaive,
}

fn default_fourier_order() -> usize {
    seasonal_regression::DEFAULT_FOURIER_ORDER
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::Mstl
    }
}

impl ModelConfig {
    /// Whether the backend reads the event calendar
    pub fn uses_events(&self) -> bool {
        matches!(self, ModelConfig::SeasonalRegression { .. })
    }

    /// Instantiate a fresh, unfitted model
    pub fn build(&self, interval_width: f64) -> Result<Box<dyn ForecastModel>> {
        let model: Box<dyn ForecastModel> = match self {
            ModelConfig::SeasonalRegression { fourier_order } => {
                Box::new(SeasonalRegression::new(*fourier_order, interval_width)?)
            }
            ModelConfig::Mstl => Box::new(Mstl::new(interval_width)?),
            ModelConfig::SeasonalNaive => Box::new(SeasonalNaive::new(interval_width)?),
        };
        Ok(model)
    }
}

pub(crate) fn check_interval_width(width: f64) -> Result<()> {
    if !(width > 0.0 && width < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Interval width must be between 0 and 1, got {}",
            width
        )));
    }
    Ok(())
}

/// Two-sided standard normal quantile for an interval of `width`
pub(crate) fn normal_quantile(width: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::MathError(e.to_string()))?;
    Ok(normal.inverse_cdf((1.0 + width) / 2.0))
}

/// Two-sided Student-t quantile for an interval of `width`
pub(crate) fn student_t_quantile(width: f64, degrees_of_freedom: usize) -> Result<f64> {
    if degrees_of_freedom == 0 {
        return Err(ForecastError::insufficient(
            Stage::Forecaster,
            "No residual degrees of freedom left for the prediction interval",
        ));
    }
    let t = StudentsT::new(0.0, 1.0, degrees_of_freedom as f64)
        .map_err(|e| ForecastError::MathError(e.to_string()))?;
    Ok(t.inverse_cdf((1.0 + width) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_symmetric_point_is_ordered() {
        let period = MonthPeriod::new(2024, 1).unwrap();
        let point = ForecastPoint::symmetric(period, 100.0, -5.0);
        assert_eq!(point.lower_bound, 95.0);
        assert_eq!(point.upper_bound, 105.0);
        assert!(point.is_ordered());
        assert!(point.is_finite());
    }

    #[test]
    fn test_quantiles() {
        assert_relative_eq!(normal_quantile(0.80).unwrap(), 1.2816, epsilon = 1e-3);
        assert_relative_eq!(normal_quantile(0.95).unwrap(), 1.9600, epsilon = 1e-3);
        // t quantiles are wider than the normal for few degrees of freedom
        assert!(student_t_quantile(0.80, 5).unwrap() > normal_quantile(0.80).unwrap());
        assert!(student_t_quantile(0.80, 0).is_err());
    }

    #[test]
    fn test_interval_width_validation() {
        assert!(check_interval_width(0.8).is_ok());
        assert!(check_interval_width(0.0).is_err());
        assert!(check_interval_width(1.0).is_err());
        assert!(check_interval_width(f64::NAN).is_err());
    }

    #[test]
    fn test_model_config_from_json() {
        let config: ModelConfig = serde_json::from_str(r#"{"kind": "seasonal_regression"}"#).unwrap();
        assert_eq!(config, ModelConfig::SeasonalRegression { fourier_order: 4 });
        assert!(config.uses_events());

        let config: ModelConfig = serde_json::from_str(r#"{"kind": "mstl"}"#).unwrap();
        assert_eq!(config, ModelConfig::default());
        assert!(!config.uses_events());
        assert_eq!(config.build(0.8).unwrap().name(), "MSTL + AutoETS");
        assert!(config.build(1.5).is_err());
        assert!(serde_json::from_str::<ModelConfig>(r#"{"kind": "arima"}"#).is_err());

        let config: ModelConfig = serde_json::from_str(r#"{"kind": "seasonal_naive"}"#).unwrap();
        assert_eq!(config.build(0.8).unwrap().name(), "Seasonal Naive");
    }
}
