//! Metrics for evaluating forecast performance

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ForecastError, Result, Stage};

/// Forecast accuracy on held-out months
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent, over non-zero actuals
    pub mape: f64,
    /// Coefficient of determination
    pub r_squared: f64,
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE: {:.2}, RMSE: {:.2}, MAPE: {:.2}%, R²: {:.3}",
            self.mae, self.rmse, self.mape, self.r_squared
        )
    }
}

/// Evaluate forecast accuracy against actual values
pub fn evaluate_forecast(forecast: &[f64], actual: &[f64]) -> Result<EvaluationMetrics> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::insufficient(
            Stage::Evaluator,
            "Forecast and actual values must have the same non-zero length",
        ));
    }
    if forecast.iter().chain(actual).any(|v| !v.is_finite()) {
        return Err(ForecastError::numeric(
            Stage::Evaluator,
            "Forecast and actual values must be finite",
        ));
    }

    let n = forecast.len() as f64;

    // Calculate errors
    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let sse = errors.iter().map(|e| e.powi(2)).sum::<f64>();
    let rmse = (sse / n).sqrt();

    let percentage_errors: Vec<f64> = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .collect();
    if percentage_errors.is_empty() {
        return Err(ForecastError::numeric(
            Stage::Evaluator,
            "MAPE is undefined when every actual value is zero",
        ));
    }
    let mape = percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64;

    let mean = actual.iter().sum::<f64>() / n;
    let sst = actual.iter().map(|a| (a - mean).powi(2)).sum::<f64>();
    let r_squared = if sst == 0.0 {
        if sse == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - sse / sst
    };

    Ok(EvaluationMetrics {
        mae,
        rmse,
        mape,
        r_squared,
    })
}

/// In-sample MAPE over the months where the model has a fitted value
pub fn in_sample_mape(fitted: &[Option<f64>], actual: &[f64]) -> Result<f64> {
    let (forecast, observed): (Vec<f64>, Vec<f64>) = fitted
        .iter()
        .zip(actual)
        .filter_map(|(f, &a)| f.filter(|f| f.is_finite()).map(|f| (f, a)))
        .unzip();
    Ok(evaluate_forecast(&forecast, &observed)?.mape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_errors() {
        let metrics = evaluate_forecast(&[110.0, 90.0, 100.0], &[100.0, 100.0, 100.0]).unwrap();
        assert_relative_eq!(metrics.mae, 20.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, (200.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(metrics.mape, 20.0 / 3.0, epsilon = 1e-12);
        // Constant actuals with errors
        assert_eq!(metrics.r_squared, 0.0);
    }

    #[test]
    fn test_perfect_forecast() {
        let metrics = evaluate_forecast(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.r_squared, 1.0);

        let flat = evaluate_forecast(&[5.0, 5.0], &[5.0, 5.0]).unwrap();
        assert_eq!(flat.r_squared, 1.0);
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let metrics = evaluate_forecast(&[5.0, 90.0], &[0.0, 100.0]).unwrap();
        assert_relative_eq!(metrics.mape, 10.0, epsilon = 1e-12);

        assert!(matches!(
            evaluate_forecast(&[1.0, 2.0], &[0.0, 0.0]),
            Err(ForecastError::NumericError { .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(evaluate_forecast(&[1.0], &[1.0, 2.0]).is_err());
        assert!(evaluate_forecast(&[], &[]).is_err());
    }

    #[test]
    fn test_in_sample_mape_ignores_undefined_fits() {
        let mape = in_sample_mape(&[None, Some(110.0)], &[50.0, 100.0]).unwrap();
        assert_relative_eq!(mape, 10.0, epsilon = 1e-12);
        assert!(in_sample_mape(&[None, None], &[50.0, 100.0]).is_err());
    }
}
