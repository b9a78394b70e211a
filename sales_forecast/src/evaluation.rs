//! Chronological holdout evaluation

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ForecastError, Result, Stage};
use crate::events::EventCalendar;
use crate::forecaster::{Forecaster, MIN_HISTORY_MONTHS};
use crate::metrics::{evaluate_forecast, EvaluationMetrics};
use crate::models::ForecastModel;
use crate::period::MonthPeriod;
use crate::series::MonthlySeries;

/// Months held out when no holdout is configured
pub const DEFAULT_HOLDOUT_MONTHS: usize = 6;

/// Smallest test window worth scoring
pub const MIN_TEST_MONTHS: usize = 3;

/// Outcome of a holdout evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub metrics: EvaluationMetrics,
    /// First and last month used for fitting
    pub train_range: (MonthPeriod, MonthPeriod),
    /// First and last month scored
    pub test_range: (MonthPeriod, MonthPeriod),
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
}

/// Scores a model by fitting on the past and forecasting the held-out tail
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    holdout: usize,
}

impl Evaluator {
    pub fn new(holdout: usize) -> Result<Self> {
        if holdout < MIN_TEST_MONTHS {
            return Err(ForecastError::insufficient(
                Stage::Evaluator,
                format!(
                    "Holdout must be at least {} months, got {}",
                    MIN_TEST_MONTHS, holdout
                ),
            ));
        }
        Ok(Self { holdout })
    }

    pub fn holdout(&self) -> usize {
        self.holdout
    }

    /// Fit `model` on all but the last `holdout` months and score the rest
    pub fn evaluate(
        &self,
        model: Box<dyn ForecastModel>,
        series: &MonthlySeries,
        events: &EventCalendar,
    ) -> Result<Evaluation> {
        if series.len() < self.holdout + MIN_HISTORY_MONTHS {
            return Err(ForecastError::insufficient(
                Stage::Evaluator,
                format!(
                    "Need {} training months plus {} held out, have {}",
                    MIN_HISTORY_MONTHS,
                    self.holdout,
                    series.len()
                ),
            ));
        }

        let (train, test) = series.split_at(series.len() - self.holdout);
        let (train_range, test_range) = match (
            train.first_period().zip(train.last_period()),
            test.first_period().zip(test.last_period()),
        ) {
            (Some(train_range), Some(test_range)) => (train_range, test_range),
            _ => {
                return Err(ForecastError::insufficient(
                    Stage::Evaluator,
                    "Training and test windows must both be non-empty",
                ))
            }
        };

        // The model only ever sees the training prefix
        let forecaster = Forecaster::new(model, test.len())?;
        let outcome = forecaster.forecast(&train, events)?;

        let predictions: Vec<f64> = outcome.points.iter().map(|p| p.point_estimate).collect();
        let actuals = test.values();
        let metrics = evaluate_forecast(&predictions, &actuals)?;

        info!(
            model = %outcome.model_name,
            train_months = train.len(),
            test_months = test.len(),
            %metrics,
            "holdout evaluation"
        );

        Ok(Evaluation {
            metrics,
            train_range,
            test_range,
            predictions,
            actuals,
        })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            holdout: DEFAULT_HOLDOUT_MONTHS,
        }
    }
}
