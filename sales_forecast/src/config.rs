//! Pipeline configuration, loadable from JSON

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::data::{ColumnOverrides, MappingRules};
use crate::error::{ForecastError, Result};
use crate::evaluation::{Evaluator, DEFAULT_HOLDOUT_MONTHS};
use crate::events::EventCalendar;
use crate::forecaster::DEFAULT_HORIZON;
use crate::models::{ModelConfig, DEFAULT_INTERVAL_WIDTH};

/// Settings for one pipeline run.
///
/// Every field has a default, so `{}` is a valid configuration:
///
/// ```json
/// {
///   "columns": { "date": "Order Date", "value": "Sales", "category": "Region" },
///   "categories": ["West"],
///   "horizon": 12,
///   "model": { "kind": "seasonal_regression", "fourier_order": 3 },
///   "events": { "black_friday": { "2023-11": 1.0, "2024-11": 1.0 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnOverrides,
    pub rules: MappingRules,
    /// Keep only these categories; empty keeps all
    pub categories: Vec<String>,
    pub horizon: usize,
    pub holdout_months: usize,
    pub interval_width: f64,
    pub model: ModelConfig,
    pub events: EventCalendar,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnOverrides::default(),
            rules: MappingRules::default(),
            categories: Vec::new(),
            horizon: DEFAULT_HORIZON,
            holdout_months: DEFAULT_HOLDOUT_MONTHS,
            interval_width: DEFAULT_INTERVAL_WIDTH,
            model: ModelConfig::default(),
            events: EventCalendar::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check ranges and that the configured model can be built
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least one month".to_string(),
            ));
        }
        Evaluator::new(self.holdout_months)?;
        if self.rules.date_keywords.is_empty() || self.rules.value_keywords.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Column keyword tables must not be empty".to_string(),
            ));
        }
        self.events.validate()?;
        // Building checks interval width, Fourier order and smoothing parameters
        self.model.build(self.interval_width)?;
        Ok(())
    }
}
