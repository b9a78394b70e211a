//! MSTL backend built on `augurs`
//!
//! The yearly pattern is removed by MSTL and the seasonally adjusted series is
//! forecast by an automatically selected exponential smoothing (ETS) trend
//! model. Point forecasts and bounds are the ones augurs reports.

use augurs::ets::AutoETS;
use augurs::forecaster::{transforms::LinearInterpolator, Forecaster as AugursForecaster};
use augurs::mstl::MSTLModel;
use augurs::Forecast;
use tracing::debug;

use crate::decomposition::{MIN_DECOMPOSITION_MONTHS, SEASONAL_PERIOD};
use crate::error::{ForecastError, Result, Stage};
use crate::events::EventCalendar;
use crate::models::{
    check_interval_width, FittedModel, ForecastModel, ForecastPoint, DEFAULT_INTERVAL_WIDTH,
};
use crate::period::MonthPeriod;
use crate::series::MonthlySeries;

const NAME: &str = "MSTL + AutoETS";

/// MSTL with a 12 month period and an AutoETS trend model
#[derive(Debug, Clone)]
pub struct Mstl {
    interval_width: f64,
}

/// Fitted MSTL model.
///
/// Keeps the history and refits augurs' forecaster for each prediction, since
/// its boxed transformers are not `Sync`. Fitting is deterministic.
#[derive(Debug, Clone)]
pub struct TrainedMstl {
    history: Vec<f64>,
    last_period: MonthPeriod,
    interval_width: f64,
    fitted: Vec<Option<f64>>,
}

enum Span {
    InSample,
    Ahead(usize),
}

impl Mstl {
    pub fn new(interval_width: f64) -> Result<Self> {
        check_interval_width(interval_width)?;
        Ok(Self { interval_width })
    }
}

impl Default for Mstl {
    fn default() -> Self {
        Self {
            interval_width: DEFAULT_INTERVAL_WIDTH,
        }
    }
}

fn run_mstl(values: &[f64], span: Span, level: f64) -> Result<Forecast> {
    let ets = AutoETS::non_seasonal().into_trend_model();
    let mstl = MSTLModel::new(vec![SEASONAL_PERIOD], ets);

    let transformers: Vec<Box<dyn augurs::forecaster::Transformer>> =
        vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = AugursForecaster::new(mstl).with_transformers(transformers);

    forecaster.fit(values).map_err(|e| {
        ForecastError::numeric(Stage::Forecaster, format!("MSTL fit failed: {}", e))
    })?;

    let forecast = match span {
        Span::InSample => forecaster.predict_in_sample(level),
        Span::Ahead(horizon) => forecaster.predict(horizon, level),
    };
    forecast.map_err(|e| {
        ForecastError::numeric(Stage::Forecaster, format!("MSTL predict failed: {}", e))
    })
}

impl ForecastModel for Mstl {
    fn fit(&self, history: &MonthlySeries, _events: &EventCalendar) -> Result<Box<dyn FittedModel>> {
        let values = history.values();
        if values.len() < MIN_DECOMPOSITION_MONTHS {
            return Err(ForecastError::insufficient(
                Stage::Forecaster,
                format!(
                    "MSTL needs at least {} months, have {}",
                    MIN_DECOMPOSITION_MONTHS,
                    values.len()
                ),
            ));
        }
        let last_period = history.last_period().ok_or_else(|| {
            ForecastError::insufficient(Stage::Forecaster, "Empty history")
        })?;

        let in_sample = run_mstl(&values, Span::InSample, self.interval_width)?;
        let fitted: Vec<Option<f64>> = in_sample
            .point
            .iter()
            .map(|&v| v.is_finite().then_some(v))
            .collect();
        if fitted.len() != values.len() {
            return Err(ForecastError::numeric(
                Stage::Forecaster,
                format!(
                    "MSTL returned {} in-sample values for {} months",
                    fitted.len(),
                    values.len()
                ),
            ));
        }

        debug!(
            months = values.len(),
            defined = fitted.iter().flatten().count(),
            "fitted MSTL"
        );

        Ok(Box::new(TrainedMstl {
            history: values,
            last_period,
            interval_width: self.interval_width,
            fitted,
        }))
    }

    fn name(&self) -> &str {
        NAME
    }
}

impl FittedModel for TrainedMstl {
    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        let forecast = run_mstl(&self.history, Span::Ahead(horizon), self.interval_width)?;
        let intervals = forecast.intervals.ok_or_else(|| {
            ForecastError::numeric(Stage::Forecaster, "MSTL returned no prediction intervals")
        })?;

        let points = forecast
            .point
            .iter()
            .zip(intervals.lower.iter().zip(&intervals.upper))
            .enumerate()
            .map(|(step, (&point_estimate, (&lower_bound, &upper_bound)))| ForecastPoint {
                period: self.last_period.offset(step as i64 + 1),
                point_estimate,
                lower_bound,
                upper_bound,
            })
            .collect();
        Ok(points)
    }

    fn fitted_values(&self) -> &[Option<f64>] {
        &self.fitted
    }

    fn name(&self) -> &str {
        NAME
    }
}
