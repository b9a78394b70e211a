//! Additive seasonal decomposition of monthly sales
//!
//! `observed = trend + seasonal + residual`, with a yearly (12 month)
//! seasonal period. Trend and seasonal components come from MSTL, the
//! STL-based decomposition that also drives the MSTL forecasting backend.
//! The residual is taken in full precision as whatever the two components
//! leave unexplained, so the components always add back to the input.

use forecast_math::statistics::{add, variance};
use forecast_math::LinearRegression;
use serde::{Deserialize, Serialize};
use stlrs::MstlParams;
use tracing::debug;

use crate::error::{ForecastError, Result, Stage};
use crate::period::MonthPeriod;
use crate::series::MonthlySeries;

/// Months per seasonal cycle
pub const SEASONAL_PERIOD: usize = 12;

/// Two full cycles are needed to estimate a yearly pattern
pub const MIN_DECOMPOSITION_MONTHS: usize = 2 * SEASONAL_PERIOD;

/// Trend, seasonal and residual components aligned to the input months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    pub periods: Vec<MonthPeriod>,
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    pub period: usize,
}

impl DecompositionResult {
    /// Half the peak-to-trough range of the average seasonal cycle
    pub fn seasonal_amplitude(&self) -> f64 {
        let pattern = self.seasonal_pattern();
        let max = pattern.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = pattern.iter().cloned().fold(f64::INFINITY, f64::min);
        (max - min) / 2.0
    }

    /// Seasonal component averaged per position in the cycle, starting at
    /// the first month of the series
    pub fn seasonal_pattern(&self) -> Vec<f64> {
        let period = self.period.max(1);
        let mut sums = vec![0.0; period];
        let mut counts = vec![0usize; period];
        for (i, value) in self.seasonal.iter().enumerate() {
            sums[i % period] += value;
            counts[i % period] += 1;
        }
        sums.iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(sum, count)| sum / count as f64)
            .collect()
    }

    /// Average month-over-month change of the trend component
    pub fn trend_slope(&self) -> Result<f64> {
        LinearRegression::fit(&self.trend)
            .map(|fit| fit.slope())
            .map_err(|e| ForecastError::from_math(Stage::Decomposer, e))
    }

    /// Strength of seasonality in [0, 1]: `1 - Var(R) / Var(S + R)`
    pub fn seasonal_strength(&self) -> Result<f64> {
        let detrended = add(&self.seasonal, &self.residual)
            .map_err(|e| ForecastError::from_math(Stage::Decomposer, e))?;
        self.strength(&detrended)
    }

    /// Strength of trend in [0, 1]: `1 - Var(R) / Var(T + R)`
    pub fn trend_strength(&self) -> Result<f64> {
        let deseasonalized = add(&self.trend, &self.residual)
            .map_err(|e| ForecastError::from_math(Stage::Decomposer, e))?;
        self.strength(&deseasonalized)
    }

    fn strength(&self, component_plus_residual: &[f64]) -> Result<f64> {
        let total = variance(component_plus_residual)
            .map_err(|e| ForecastError::from_math(Stage::Decomposer, e))?;
        if total <= f64::EPSILON {
            return Ok(0.0);
        }
        let residual = variance(&self.residual)
            .map_err(|e| ForecastError::from_math(Stage::Decomposer, e))?;
        Ok((1.0 - residual / total).clamp(0.0, 1.0))
    }

    /// trend + seasonal + residual, month by month
    pub fn reconstruct(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.seasonal)
            .zip(&self.residual)
            .map(|((t, s), r)| t + s + r)
            .collect()
    }
}

/// Additive MSTL decomposition with a yearly period
#[derive(Debug, Clone, Default)]
pub struct Decomposer;

impl Decomposer {
    pub fn new() -> Self {
        Self
    }

    pub fn decompose(&self, series: &MonthlySeries) -> Result<DecompositionResult> {
        if series.len() < MIN_DECOMPOSITION_MONTHS {
            return Err(ForecastError::insufficient(
                Stage::Decomposer,
                format!(
                    "Need at least {} months to estimate yearly seasonality, have {}",
                    MIN_DECOMPOSITION_MONTHS,
                    series.len()
                ),
            ));
        }

        let observed = series.values();
        let periods = series.periods();

        // stlrs works in single precision
        let input: Vec<f32> = observed.iter().map(|&v| v as f32).collect();
        let fit = MstlParams::new()
            .fit(&input, &[SEASONAL_PERIOD])
            .map_err(|e| {
                ForecastError::numeric(
                    Stage::Decomposer,
                    format!("MSTL decomposition failed: {:?}", e),
                )
            })?;

        let trend: Vec<f64> = fit.trend().iter().map(|&v| f64::from(v)).collect();
        let mut seasonal = vec![0.0; observed.len()];
        for component in fit.seasonal() {
            for (total, &value) in seasonal.iter_mut().zip(component) {
                *total += f64::from(value);
            }
        }
        if trend.len() != observed.len() {
            return Err(ForecastError::numeric(
                Stage::Decomposer,
                format!(
                    "MSTL returned {} trend values for {} months",
                    trend.len(),
                    observed.len()
                ),
            ));
        }

        let residual: Vec<f64> = observed
            .iter()
            .zip(&trend)
            .zip(&seasonal)
            .map(|((y, t), s)| y - t - s)
            .collect();

        if residual.iter().any(|r| !r.is_finite()) {
            return Err(ForecastError::numeric(
                Stage::Decomposer,
                "Decomposition produced non-finite components",
            ));
        }

        debug!(months = observed.len(), "decomposed series");

        Ok(DecompositionResult {
            periods,
            observed,
            trend,
            seasonal,
            residual,
            period: SEASONAL_PERIOD,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synthetic(months: usize, slope: f64, amplitude: f64) -> MonthlySeries {
        let values: Vec<f64> = (0..months)
            .map(|i| {
                let season = amplitude
                    * (2.0 * std::f64::consts::PI * i as f64 / SEASONAL_PERIOD as f64).sin();
                500.0 + slope * i as f64 + season
            })
            .collect();
        MonthlySeries::from_values(MonthPeriod::new(2019, 1).unwrap(), &values).unwrap()
    }

    #[test]
    fn test_rejects_short_history() {
        let series = synthetic(23, 1.0, 10.0);
        let err = Decomposer::new().decompose(&series).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientDataError {
                stage: Stage::Decomposer,
                ..
            }
        ));
    }

    #[test]
    fn test_recovers_trend_and_season_without_noise() {
        let result = Decomposer::new().decompose(&synthetic(48, 3.0, 40.0)).unwrap();

        assert_relative_eq!(result.trend_slope().unwrap(), 3.0, max_relative = 0.05);
        assert_relative_eq!(result.seasonal_amplitude(), 40.0, max_relative = 0.05);
        assert!(result.seasonal_strength().unwrap() > 0.9);
    }

    #[test]
    fn test_components_add_back_to_the_input() {
        let series = synthetic(40, 12.5, 300.0);
        let result = Decomposer::new().decompose(&series).unwrap();

        for (observed, rebuilt) in series.values().iter().zip(result.reconstruct()) {
            assert!((observed - rebuilt).abs() <= 1e-9 * observed.abs());
        }
    }

    #[test]
    fn test_components_are_aligned() {
        let series = synthetic(30, 1.0, 5.0);
        let result = Decomposer::new().decompose(&series).unwrap();
        assert_eq!(result.trend.len(), 30);
        assert_eq!(result.seasonal.len(), 30);
        assert_eq!(result.residual.len(), 30);
        assert_eq!(result.periods, series.periods());
        assert_eq!(result.period, SEASONAL_PERIOD);
        assert_eq!(result.seasonal_pattern().len(), SEASONAL_PERIOD);
    }

    #[test]
    fn test_seasonal_component_is_centered() {
        let result = Decomposer::new().decompose(&synthetic(36, 2.0, 25.0)).unwrap();
        let mean = result.seasonal.iter().sum::<f64>() / result.seasonal.len() as f64;
        assert!(mean.abs() < 2.5, "seasonal mean {}", mean);
    }
}
