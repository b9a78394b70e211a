//! Report assembly and export

use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, warn};

use crate::decomposition::DecompositionResult;
use crate::error::{ForecastError, Result, Stage};
use crate::evaluation::Evaluation;
use crate::forecaster::ForecastOutcome;
use crate::metrics::in_sample_mape;
use crate::series::MonthlySeries;

/// Header of the forecast CSV export
pub const FORECAST_CSV_HEADER: [&str; 4] = ["Date", "Forecast", "Lower Bound", "Upper Bound"];

/// Headline figures for a forecast run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub average_monthly_sales: f64,
    /// `100 - in-sample MAPE`, when the model has in-sample fits to score
    pub in_sample_accuracy: Option<f64>,
    /// Sum of the forecast point estimates
    pub projected_total: f64,
}

/// Everything a run produced, ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub model_name: String,
    pub history: MonthlySeries,
    pub decomposition: DecompositionResult,
    pub forecast: ForecastOutcome,
    pub evaluation: Evaluation,
}

impl ForecastReport {
    pub fn assemble(
        model_name: impl Into<String>,
        history: MonthlySeries,
        decomposition: DecompositionResult,
        forecast: ForecastOutcome,
        evaluation: Evaluation,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            history,
            decomposition,
            forecast,
            evaluation,
        }
    }

    pub fn summary(&self) -> ExecutiveSummary {
        let values = self.history.values();
        let average_monthly_sales = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };

        let in_sample_accuracy = match in_sample_mape(&self.forecast.fitted, &values) {
            Ok(mape) => Some(100.0 - mape),
            Err(err) => {
                warn!(error = %err, "in-sample accuracy unavailable");
                None
            }
        };

        ExecutiveSummary {
            average_monthly_sales,
            in_sample_accuracy,
            projected_total: self.forecast.projected_total(),
        }
    }

    /// Pretty-printed JSON of the whole report
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ForecastError::from)
    }

    /// Read back a report written by [`ForecastReport::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ForecastError::from)
    }

    /// Write the forecast points as `Date,Forecast,Lower Bound,Upper Bound`
    pub fn write_forecast_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(FORECAST_CSV_HEADER)?;

        for point in &self.forecast.points {
            let date = point.period.first_day().ok_or_else(|| {
                ForecastError::numeric(
                    Stage::ReportAssembler,
                    format!("{} has no calendar date", point.period),
                )
            })?;
            csv_writer.write_record([
                date.format("%Y-%m-%d").to_string(),
                format!("{:.2}", point.point_estimate),
                format!("{:.2}", point.lower_bound),
                format!("{:.2}", point.upper_bound),
            ])?;
        }

        csv_writer.flush()?;
        debug!(rows = self.forecast.points.len(), "wrote forecast CSV");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::Decomposer;
    use crate::metrics::EvaluationMetrics;
    use crate::models::ForecastPoint;
    use crate::period::MonthPeriod;
    use pretty_assertions::assert_eq;

    fn report() -> ForecastReport {
        let start = MonthPeriod::new(2022, 1).unwrap();
        let values: Vec<f64> = (0..24).map(|i| 100.0 + i as f64).collect();
        let history = MonthlySeries::from_values(start, &values).unwrap();
        let decomposition = Decomposer::new().decompose(&history).unwrap();

        let mut fitted = vec![None; 12];
        fitted.extend(values[12..].iter().map(|v| Some(v * 1.1)));
        let forecast = ForecastOutcome {
            model_name: "Test".to_string(),
            points: vec![
                ForecastPoint::symmetric(start.offset(24), 130.0, 5.0),
                ForecastPoint::symmetric(start.offset(25), 131.5, 6.25),
            ],
            fitted,
        };
        let evaluation = Evaluation {
            metrics: EvaluationMetrics {
                mae: 1.0,
                rmse: 1.0,
                mape: 1.0,
                r_squared: 0.9,
            },
            train_range: (start, start.offset(17)),
            test_range: (start.offset(18), start.offset(23)),
            predictions: vec![0.0; 6],
            actuals: vec![0.0; 6],
        };

        ForecastReport::assemble("Test", history, decomposition, forecast, evaluation)
    }

    #[test]
    fn test_summary() {
        let summary = report().summary();
        assert!((summary.average_monthly_sales - 111.5).abs() < 1e-9);
        assert!((summary.projected_total - 261.5).abs() < 1e-9);
        assert!((summary.in_sample_accuracy.unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_csv() {
        let mut buffer = Vec::new();
        report().write_forecast_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(
            text,
            "Date,Forecast,Lower Bound,Upper Bound\n\
             2024-01-01,130.00,125.00,135.00\n\
             2024-02-01,131.50,125.25,137.75\n"
        );
    }

    #[test]
    fn test_json_contains_sections() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["model_name"], "Test");
        assert_eq!(value["forecast"]["points"][0]["period"], "2024-01");
        assert!(value["decomposition"]["trend"].is_array());
        // Months without an in-sample fit are written as null
        assert!(value["forecast"]["fitted"][0].is_null());
    }

    #[test]
    fn test_json_reads_back() {
        let report = report();
        let restored = ForecastReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(restored, report);
    }
}
