//! Canonical monthly sales observations and validated series

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result, Stage};
use crate::period::MonthPeriod;

/// One month of aggregated sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    pub period: MonthPeriod,
    /// Non-negative monthly total
    pub amount: f64,
    pub category: Option<String>,
    /// True when the month had no rows and was zero-filled
    pub filled: bool,
}

impl MonthlyObservation {
    pub fn new(period: MonthPeriod, amount: f64) -> Self {
        Self {
            period,
            amount,
            category: None,
            filled: false,
        }
    }
}

/// A contiguous run of monthly observations for a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    category: Option<String>,
    observations: Vec<MonthlyObservation>,
}

impl MonthlySeries {
    /// Validate and wrap observations.
    ///
    /// Observations must be in order, one per month without gaps, share one
    /// category, and carry finite non-negative amounts.
    pub fn new(observations: Vec<MonthlyObservation>) -> Result<Self> {
        let category = observations.first().and_then(|o| o.category.clone());

        for pair in observations.windows(2) {
            if pair[1].period != pair[0].period.succ() {
                return Err(ForecastError::schema(
                    Stage::Normalizer,
                    format!(
                        "Monthly series is not contiguous: {} is followed by {}",
                        pair[0].period, pair[1].period
                    ),
                ));
            }
        }

        for observation in &observations {
            if observation.category != category {
                return Err(ForecastError::schema(
                    Stage::Normalizer,
                    "Monthly series mixes categories",
                ));
            }
            if !observation.amount.is_finite() || observation.amount < 0.0 {
                return Err(ForecastError::numeric(
                    Stage::Normalizer,
                    format!(
                        "Amount for {} must be finite and non-negative, got {}",
                        observation.period, observation.amount
                    ),
                ));
            }
        }

        Ok(Self {
            category,
            observations,
        })
    }

    /// Build an uncategorized series of consecutive months starting at `start`
    pub fn from_values(start: MonthPeriod, values: &[f64]) -> Result<Self> {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &amount)| MonthlyObservation::new(start.offset(i as i64), amount))
            .collect();
        Self::new(observations)
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn observations(&self) -> &[MonthlyObservation] {
        &self.observations
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.amount).collect()
    }

    pub fn periods(&self) -> Vec<MonthPeriod> {
        self.observations.iter().map(|o| o.period).collect()
    }

    pub fn first_period(&self) -> Option<MonthPeriod> {
        self.observations.first().map(|o| o.period)
    }

    pub fn last_period(&self) -> Option<MonthPeriod> {
        self.observations.last().map(|o| o.period)
    }

    /// Number of zero-filled months
    pub fn filled_count(&self) -> usize {
        self.observations.iter().filter(|o| o.filled).count()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Split chronologically into owned `[0, at)` and `[at, len)` series
    pub fn split_at(&self, at: usize) -> (MonthlySeries, MonthlySeries) {
        let at = at.min(self.observations.len());
        let (head, tail) = self.observations.split_at(at);
        (
            MonthlySeries {
                category: self.category.clone(),
                observations: head.to_vec(),
            },
            MonthlySeries {
                category: self.category.clone(),
                observations: tail.to_vec(),
            },
        )
    }
}
