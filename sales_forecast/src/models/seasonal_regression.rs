//! Seasonality-aware regression for monthly sales
//!
//! `y_t = a + b*t + sum_k (c_k cos(2 pi k m / 12) + s_k sin(2 pi k m / 12)) + sum_j g_j e_j(t)`
//!
//! where `t` counts months from the start of the history, `m` is the
//! month of year and `e_j` are event regressors. Coefficients come from
//! ordinary least squares; the uncertainty bounds are the OLS prediction
//! interval `y_hat +/- t_q * s * sqrt(1 + x'(X'X)^-1 x)`.

use forecast_math::regression::DEFAULT_RIDGE;
use forecast_math::{least_squares, LeastSquares};
use std::f64::consts::PI;
use tracing::debug;

use crate::decomposition::SEASONAL_PERIOD;
use crate::error::{ForecastError, Result, Stage};
use crate::events::EventCalendar;
use crate::models::{
    check_interval_width, student_t_quantile, FittedModel, ForecastModel, ForecastPoint,
    DEFAULT_INTERVAL_WIDTH,
};
use crate::period::MonthPeriod;
use crate::series::MonthlySeries;

pub const DEFAULT_FOURIER_ORDER: usize = 4;

/// Highest order that still adds distinct monthly terms
pub const MAX_FOURIER_ORDER: usize = SEASONAL_PERIOD / 2;

/// Linear trend plus yearly seasonality and event regressors
#[derive(Debug, Clone)]
pub struct SeasonalRegression {
    name: String,
    fourier_order: usize,
    interval_width: f64,
}

/// Fitted seasonal regression
#[derive(Debug, Clone)]
pub struct TrainedSeasonalRegression {
    name: String,
    fourier_order: usize,
    fit: LeastSquares,
    fitted: Vec<Option<f64>>,
    events: EventCalendar,
    event_names: Vec<String>,
    last_period: MonthPeriod,
    observations: usize,
    sigma: f64,
    quantile: f64,
}

impl SeasonalRegression {
    /// Create a new seasonal regression model
    pub fn new(fourier_order: usize, interval_width: f64) -> Result<Self> {
        if fourier_order == 0 || fourier_order > MAX_FOURIER_ORDER {
            return Err(ForecastError::InvalidParameter(format!(
                "Fourier order must be between 1 and {}",
                MAX_FOURIER_ORDER
            )));
        }
        check_interval_width(interval_width)?;

        Ok(Self {
            name: format!("Seasonal Regression (order={})", fourier_order),
            fourier_order,
            interval_width,
        })
    }
}

impl Default for SeasonalRegression {
    fn default() -> Self {
        Self {
            name: format!("Seasonal Regression (order={})", DEFAULT_FOURIER_ORDER),
            fourier_order: DEFAULT_FOURIER_ORDER,
            interval_width: DEFAULT_INTERVAL_WIDTH,
        }
    }
}

/// One design row: intercept, trend, Fourier pairs, events
fn design_row(
    t: usize,
    period: &MonthPeriod,
    fourier_order: usize,
    events: &EventCalendar,
    event_names: &[String],
) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + 2 * fourier_order + event_names.len());
    row.push(1.0);
    row.push(t as f64);

    let month = period.month_of_year() as f64;
    for k in 1..=fourier_order {
        let angle = 2.0 * PI * k as f64 * month / SEASONAL_PERIOD as f64;
        row.push(angle.cos());
        // sin(pi * m) vanishes at every month
        if 2 * k != SEASONAL_PERIOD {
            row.push(angle.sin());
        }
    }

    for name in event_names {
        row.push(events.value(name, period));
    }
    row
}

impl ForecastModel for SeasonalRegression {
    fn fit(&self, history: &MonthlySeries, events: &EventCalendar) -> Result<Box<dyn FittedModel>> {
        let periods = history.periods();
        let values = history.values();
        let last_period = history.last_period().ok_or_else(|| {
            ForecastError::insufficient(Stage::Forecaster, "Empty history")
        })?;

        // Events that never occur in history cannot be estimated
        let event_names: Vec<String> = events
            .names()
            .into_iter()
            .filter(|name| periods.iter().any(|p| events.value(name, p) != 0.0))
            .map(str::to_string)
            .collect();

        let design: Vec<Vec<f64>> = periods
            .iter()
            .enumerate()
            .map(|(t, p)| design_row(t, p, self.fourier_order, events, &event_names))
            .collect();

        let parameters = design.first().map(Vec::len).unwrap_or(0);
        if values.len() <= parameters {
            return Err(ForecastError::insufficient(
                Stage::Forecaster,
                format!(
                    "{} needs more than {} months, have {}",
                    self.name,
                    parameters,
                    values.len()
                ),
            ));
        }

        let fit = least_squares(&design, &values, DEFAULT_RIDGE)
            .map_err(|e| ForecastError::from_math(Stage::Forecaster, e))?;

        let degrees_of_freedom = values.len() - parameters;
        let sigma = (fit.sum_squared_residuals() / degrees_of_freedom as f64).sqrt();
        let quantile = student_t_quantile(self.interval_width, degrees_of_freedom)?;

        debug!(
            model = %self.name,
            parameters,
            events = event_names.len(),
            sigma,
            "fitted seasonal regression"
        );

        let fitted = fit.fitted().iter().copied().map(Some).collect();

        Ok(Box::new(TrainedSeasonalRegression {
            name: self.name.clone(),
            fourier_order: self.fourier_order,
            fit,
            fitted,
            events: events.clone(),
            event_names,
            last_period,
            observations: values.len(),
            sigma,
            quantile,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedModel for TrainedSeasonalRegression {
    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        (1..=horizon)
            .map(|step| {
                let period = self.last_period.offset(step as i64);
                let t = self.observations + step - 1;
                let row = design_row(
                    t,
                    &period,
                    self.fourier_order,
                    &self.events,
                    &self.event_names,
                );
                let estimate = self
                    .fit
                    .predict(&row)
                    .map_err(|e| ForecastError::from_math(Stage::Forecaster, e))?;
                let leverage = self
                    .fit
                    .leverage(&row)
                    .map_err(|e| ForecastError::from_math(Stage::Forecaster, e))?;
                let margin = self.quantile * self.sigma * (1.0 + leverage).sqrt();
                Ok(ForecastPoint::symmetric(period, estimate, margin))
            })
            .collect()
    }

    fn fitted_values(&self) -> &[Option<f64>] {
        &self.fitted
    }

    fn name(&self) -> &str {
        &self.name
    }
}
