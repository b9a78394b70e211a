use approx::assert_relative_eq;
use rstest::rstest;
use sales_forecast::decomposition::Decomposer;
use sales_forecast::error::{ForecastError, Stage};
use sales_forecast::events::EventCalendar;
use sales_forecast::forecaster::Forecaster;
use sales_forecast::models::ModelConfig;
use sales_forecast::period::MonthPeriod;
use sales_forecast::synthetic::SyntheticSales;
use sales_forecast::{ForecastReport, PipelineConfig, SalesPipeline};
use std::io::Write;
use tempfile::NamedTempFile;

fn start() -> MonthPeriod {
    MonthPeriod::new(2019, 1).unwrap()
}

fn noisy(months: usize) -> SyntheticSales {
    SyntheticSales::new(start(), months)
        .base(10_000.0)
        .slope(50.0)
        .amplitude(1_500.0)
        .noise(150.0)
        .seed(2024)
}

#[test]
fn test_decomposition_reconstructs_the_series() {
    let series = noisy(48).series().unwrap();
    let result = Decomposer::new().decompose(&series).unwrap();

    for (observed, rebuilt) in result.observed.iter().zip(result.reconstruct()) {
        assert!((observed - rebuilt).abs() <= 1e-6 * observed.abs());
    }
}

#[test]
fn test_decomposition_recovers_slope_and_amplitude() {
    let series = noisy(48).series().unwrap();
    let result = Decomposer::new().decompose(&series).unwrap();

    let slope = result.trend_slope().unwrap();
    let amplitude = result.seasonal_amplitude();
    assert!((slope - 50.0).abs() <= 5.0, "slope {}", slope);
    assert!((amplitude - 1_500.0).abs() <= 150.0, "amplitude {}", amplitude);
}

#[rstest]
#[case::seasonal_regression(ModelConfig::SeasonalRegression { fourier_order: 4 })]
#[case::mstl(ModelConfig::Mstl)]
#[case::seasonal_naive(ModelConfig::SeasonalNaive)]
fn test_forecast_invariants(#[case] config: ModelConfig, #[values(1, 6, 13)] horizon: usize) {
    let history = noisy(40).series().unwrap();
    let model = config.build(0.8).unwrap();
    let outcome = Forecaster::new(model, horizon)
        .unwrap()
        .forecast(&history, &EventCalendar::new())
        .unwrap();

    assert_eq!(outcome.points.len(), horizon);
    let last = history.last_period().unwrap();
    for (step, point) in outcome.points.iter().enumerate() {
        assert_eq!(point.period, last.offset(step as i64 + 1));
        assert!(point.lower_bound <= point.point_estimate);
        assert!(point.point_estimate <= point.upper_bound);
    }
    assert_eq!(outcome.fitted.len(), history.len());
}

#[rstest]
#[case::seasonal_regression(ModelConfig::SeasonalRegression { fourier_order: 4 })]
#[case::mstl(ModelConfig::Mstl)]
#[case::seasonal_naive(ModelConfig::SeasonalNaive)]
fn test_report_json_reads_back(#[case] model: ModelConfig) {
    let config = PipelineConfig {
        model,
        ..PipelineConfig::default()
    };
    let report = SalesPipeline::new(config)
        .unwrap()
        .run_series(noisy(40).series().unwrap())
        .unwrap();

    let restored = ForecastReport::from_json(&report.to_json().unwrap()).unwrap();
    assert_eq!(restored, report);
}

#[test]
fn test_holdout_forecast_is_accurate() {
    let series = noisy(48).series().unwrap();
    let (train, test) = series.split_at(42);

    let outcome = Forecaster::new(ModelConfig::default().build(0.8).unwrap(), 6)
        .unwrap()
        .forecast(&train, &EventCalendar::new())
        .unwrap();

    let predictions: Vec<f64> = outcome.points.iter().map(|p| p.point_estimate).collect();
    let metrics =
        sales_forecast::metrics::evaluate_forecast(&predictions, &test.values()).unwrap();
    assert!(metrics.mape < 20.0, "MAPE {}", metrics.mape);
}

#[test]
fn test_evaluation_never_sees_the_test_window() {
    let series = noisy(48).series().unwrap();
    let config = PipelineConfig::default();
    let report = SalesPipeline::new(config).unwrap().run_series(series.clone()).unwrap();

    // Corrupting the held-out months must not change the holdout predictions
    let mut corrupted = series.values();
    for value in corrupted.iter_mut().skip(42) {
        *value *= 3.0;
    }
    let corrupted = sales_forecast::MonthlySeries::from_values(start(), &corrupted).unwrap();
    let corrupted_report = SalesPipeline::new(PipelineConfig::default())
        .unwrap()
        .run_series(corrupted)
        .unwrap();

    assert_eq!(
        report.evaluation.predictions,
        corrupted_report.evaluation.predictions
    );
    assert_ne!(report.evaluation.actuals, corrupted_report.evaluation.actuals);
}

#[test]
fn test_pipeline_from_csv() {
    let values = noisy(36).values().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Order Date,Region,Revenue").unwrap();
    for (i, value) in values.iter().enumerate() {
        let period = start().offset(i as i64);
        // Two transactions per month, split across regions
        writeln!(file, "{}-{:02}-03,West,{:.2}", period.year(), period.month(), value * 0.6).unwrap();
        writeln!(file, "{}-{:02}-17,East,{:.2}", period.year(), period.month(), value * 0.4).unwrap();
    }

    let config = PipelineConfig::from_json_str(r#"{"horizon": 12, "holdout_months": 6}"#).unwrap();
    let report = SalesPipeline::new(config).unwrap().run_csv(file.path()).unwrap();

    assert_eq!(report.history.len(), 36);
    assert_eq!(report.forecast.points.len(), 12);
    assert_eq!(report.forecast.points[0].period, MonthPeriod::new(2022, 1).unwrap());
    assert_relative_eq!(report.history.values()[0], values[0], epsilon = 0.02);

    let summary = report.summary();
    assert!(summary.projected_total > 0.0);
    assert!(summary.in_sample_accuracy.unwrap() > 80.0);

    let mut exported = Vec::new();
    report.write_forecast_csv(&mut exported).unwrap();
    let exported = String::from_utf8(exported).unwrap();
    assert!(exported.starts_with("Date,Forecast,Lower Bound,Upper Bound\n2022-01-01,"));
    assert_eq!(exported.lines().count(), 13);
}

#[test]
fn test_pipeline_requires_training_and_holdout() {
    let series = noisy(29).series().unwrap();
    let err = SalesPipeline::new(PipelineConfig::default())
        .unwrap()
        .run_series(series)
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Evaluator));
}

#[test]
fn test_pipeline_rejects_short_history_in_decomposer() {
    let series = noisy(18).series().unwrap();
    let err = SalesPipeline::new(PipelineConfig::default())
        .unwrap()
        .run_series(series)
        .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientDataError {
            stage: Stage::Decomposer,
            ..
        }
    ));
}

#[test]
fn test_events_flow_through_the_pipeline() {
    let mut values = noisy(48).values().unwrap();
    let mut events = EventCalendar::new();
    for i in 0..54 {
        let period = start().offset(i);
        if period.month() == 11 {
            events.insert("black_friday", period, 1.0).unwrap();
            if let Some(value) = values.get_mut(i as usize) {
                *value += 4_000.0;
            }
        }
    }
    let series = sales_forecast::MonthlySeries::from_values(start(), &values).unwrap();
    let config = PipelineConfig {
        events,
        model: ModelConfig::SeasonalRegression { fourier_order: 4 },
        ..PipelineConfig::default()
    };

    let report = SalesPipeline::new(config).unwrap().run_series(series).unwrap();
    // Forecast runs 2023-01 to 2023-06; the evaluation covers 2022-07 to 2022-12
    assert!(report.evaluation.metrics.mape < 10.0, "{}", report.evaluation.metrics);
}
