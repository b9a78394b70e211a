//! Seasonal naive baseline: every month repeats the same month one year earlier.

use tracing::debug;

use crate::decomposition::SEASONAL_PERIOD;
use crate::error::{ForecastError, Result, Stage};
use crate::events::EventCalendar;
use crate::models::{
    check_interval_width, normal_quantile, FittedModel, ForecastModel, ForecastPoint,
};
use crate::period::MonthPeriod;
use crate::series::MonthlySeries;

#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    interval_width: f64,
}

#[derive(Debug, Clone)]
pub struct TrainedSeasonalNaive {
    last_season: Vec<f64>,
    last_period: MonthPeriod,
    fitted: Vec<Option<f64>>,
    sigma: f64,
    quantile: f64,
}

impl SeasonalNaive {
    pub fn new(interval_width: f64) -> Result<Self> {
        check_interval_width(interval_width)?;
        Ok(Self { interval_width })
    }
}

impl ForecastModel for SeasonalNaive {
    fn fit(&self, history: &MonthlySeries, _events: &EventCalendar) -> Result<Box<dyn FittedModel>> {
        let values = history.values();
        let m = SEASONAL_PERIOD;
        if values.len() <= m {
            return Err(ForecastError::insufficient(
                Stage::Forecaster,
                format!(
                    "Seasonal naive needs more than {} months, have {}",
                    m,
                    values.len()
                ),
            ));
        }
        let last_period = history.last_period().ok_or_else(|| {
            ForecastError::insufficient(Stage::Forecaster, "Empty history")
        })?;

        // The first year has no year-ago value to repeat
        let mut fitted = vec![None; m];
        fitted.extend(values[..values.len() - m].iter().copied().map(Some));

        let differences: Vec<f64> = values
            .iter()
            .skip(m)
            .zip(&values)
            .map(|(current, year_ago)| current - year_ago)
            .collect();
        let sigma = (differences.iter().map(|d| d * d).sum::<f64>()
            / differences.len() as f64)
            .sqrt();

        debug!(sigma, "fitted seasonal naive");

        Ok(Box::new(TrainedSeasonalNaive {
            last_season: values[values.len() - m..].to_vec(),
            last_period,
            fitted,
            sigma,
            quantile: normal_quantile(self.interval_width)?,
        }))
    }

    fn name(&self) -> &str {
        "Seasonal Naive"
    }
}

impl FittedModel for TrainedSeasonalNaive {
    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        let m = SEASONAL_PERIOD;
        let points = (1..=horizon)
            .map(|h| {
                let estimate = self.last_season[(h - 1) % m];
                // Completed years since the last observation
                let years = ((h - 1) / m) as f64;
                let margin = self.quantile * self.sigma * (years + 1.0).sqrt();
                ForecastPoint::symmetric(self.last_period.offset(h as i64), estimate, margin)
            })
            .collect();
        Ok(points)
    }

    fn fitted_values(&self) -> &[Option<f64>] {
        &self.fitted
    }

    fn name(&self) -> &str {
        "Seasonal Naive"
    }
}
