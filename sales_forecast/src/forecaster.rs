//! Forecast generation on top of a fitted model

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decomposition::MIN_DECOMPOSITION_MONTHS;
use crate::error::{ForecastError, Result, Stage};
use crate::events::EventCalendar;
use crate::models::{ForecastModel, ForecastPoint, SeasonalRegression};
use crate::series::MonthlySeries;

/// Minimum months of history before a forecast is attempted
pub const MIN_HISTORY_MONTHS: usize = MIN_DECOMPOSITION_MONTHS;

/// Months forecast when no horizon is configured
pub const DEFAULT_HORIZON: usize = 6;

/// Result of one forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutcome {
    pub model_name: String,
    /// One point per month immediately after the history
    pub points: Vec<ForecastPoint>,
    /// In-sample predictions aligned with the history, `None` where the
    /// model has none
    pub fitted: Vec<Option<f64>>,
}

impl ForecastOutcome {
    /// Sum of the point estimates
    pub fn projected_total(&self) -> f64 {
        self.points.iter().map(|p| p.point_estimate).sum()
    }
}

/// Fits a model on a history and projects it forward
#[derive(Debug)]
pub struct Forecaster {
    model: Box<dyn ForecastModel>,
    horizon: usize,
}

impl Forecaster {
    pub fn new(model: Box<dyn ForecastModel>, horizon: usize) -> Result<Self> {
        check_horizon(horizon)?;
        Ok(Self { model, horizon })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Forecast the configured horizon after `history`
    pub fn forecast(&self, history: &MonthlySeries, events: &EventCalendar) -> Result<ForecastOutcome> {
        self.forecast_horizon(history, events, self.horizon)
    }

    /// Forecast `horizon` months after `history`
    pub fn forecast_horizon(
        &self,
        history: &MonthlySeries,
        events: &EventCalendar,
        horizon: usize,
    ) -> Result<ForecastOutcome> {
        check_horizon(horizon)?;
        if history.len() < MIN_HISTORY_MONTHS {
            return Err(ForecastError::insufficient(
                Stage::Forecaster,
                format!(
                    "Need at least {} months of history, have {}",
                    MIN_HISTORY_MONTHS,
                    history.len()
                ),
            ));
        }
        let last_period = history.last_period().ok_or_else(|| {
            ForecastError::insufficient(Stage::Forecaster, "Empty history")
        })?;

        let fitted = self.model.fit(history, events)?;
        let points = fitted.predict(horizon)?;

        if points.len() != horizon {
            return Err(ForecastError::numeric(
                Stage::Forecaster,
                format!(
                    "{} returned {} points for a horizon of {}",
                    fitted.name(),
                    points.len(),
                    horizon
                ),
            ));
        }

        for (step, point) in points.iter().enumerate() {
            let expected = last_period.offset(step as i64 + 1);
            if point.period != expected {
                return Err(ForecastError::numeric(
                    Stage::Forecaster,
                    format!("Expected forecast for {}, got {}", expected, point.period),
                ));
            }
            if !point.is_finite() {
                return Err(ForecastError::numeric(
                    Stage::Forecaster,
                    format!("Non-finite forecast for {}", point.period),
                ));
            }
            if !point.is_ordered() {
                return Err(ForecastError::numeric(
                    Stage::Forecaster,
                    format!(
                        "Bounds for {} do not contain the estimate: [{}, {}] around {}",
                        point.period, point.lower_bound, point.upper_bound, point.point_estimate
                    ),
                ));
            }
        }

        debug!(model = fitted.name(), horizon, "forecast points validated");
        info!(
            model = fitted.name(),
            from = %points[0].period,
            months = horizon,
            "generated forecast"
        );

        Ok(ForecastOutcome {
            model_name: fitted.name().to_string(),
            points,
            fitted: fitted.fitted_values().to_vec(),
        })
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self {
            model: Box::new(SeasonalRegression::default()),
            horizon: DEFAULT_HORIZON,
        }
    }
}

fn check_horizon(horizon: usize) -> Result<()> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "Forecast horizon must be at least one month".to_string(),
        ));
    }
    Ok(())
}
