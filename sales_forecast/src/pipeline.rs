//! End-to-end forecasting run: normalize, decompose, evaluate, forecast, report

use polars::prelude::DataFrame;
use std::path::Path;
use tracing::{info, info_span, warn};

use crate::config::PipelineConfig;
use crate::data::{DataLoader, Normalizer};
use crate::decomposition::Decomposer;
use crate::error::Result;
use crate::evaluation::Evaluator;
use crate::forecaster::Forecaster;
use crate::report::ForecastReport;
use crate::series::MonthlySeries;

/// Runs the stages in order and stops at the first failure
#[derive(Debug, Clone, Default)]
pub struct SalesPipeline {
    config: PipelineConfig,
}

impl SalesPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a CSV file and run on it
    pub fn run_csv<P: AsRef<Path>>(&self, path: P) -> Result<ForecastReport> {
        let df = DataLoader::from_csv(path)?;
        self.run(&df)
    }

    pub fn run(&self, df: &DataFrame) -> Result<ForecastReport> {
        let history = {
            let _span = info_span!("normalize").entered();
            let normalized = Normalizer::new(self.config.rules.clone(), self.config.columns.clone())
                .with_category_filter(self.config.categories.clone())
                .normalize(df)?;
            info!(
                rows = normalized.rows_read(),
                dropped = normalized.rows_dropped(),
                categories = normalized.categories().len(),
                "normalized sales"
            );
            normalized.total()?
        };

        self.run_series(history)
    }

    /// Run every stage after normalization on an existing monthly series
    pub fn run_series(&self, history: MonthlySeries) -> Result<ForecastReport> {
        if !self.config.events.is_empty() && !self.config.model.uses_events() {
            warn!(
                events = self.config.events.names().len(),
                "configured model ignores the event calendar"
            );
        }

        let decomposition = {
            let _span = info_span!("decompose").entered();
            Decomposer::new().decompose(&history)?
        };

        let evaluation = {
            let _span = info_span!("evaluate").entered();
            let model = self.config.model.build(self.config.interval_width)?;
            Evaluator::new(self.config.holdout_months)?.evaluate(
                model,
                &history,
                &self.config.events,
            )?
        };

        let forecast = {
            let _span = info_span!("forecast").entered();
            let model = self.config.model.build(self.config.interval_width)?;
            Forecaster::new(model, self.config.horizon)?.forecast(&history, &self.config.events)?
        };

        let report = {
            let _span = info_span!("assemble").entered();
            ForecastReport::assemble(
                forecast.model_name.clone(),
                history,
                decomposition,
                forecast,
                evaluation,
            )
        };

        info!(
            model = %report.model_name,
            months = report.history.len(),
            mape = report.evaluation.metrics.mape,
            "pipeline finished"
        );
        Ok(report)
    }
}
