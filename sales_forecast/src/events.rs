//! Known holiday and promotion events used as regressors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ForecastError, Result};
use crate::period::MonthPeriod;

/// Named event regressors keyed by month.
///
/// A month that is not listed for an event has value 0. Entries may cover
/// both history and the forecast horizon; future entries are how callers
/// supply known upcoming events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCalendar {
    events: BTreeMap<String, BTreeMap<MonthPeriod, f64>>,
}

impl EventCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of `name` in `period`
    pub fn insert(&mut self, name: &str, period: MonthPeriod, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "Event '{}' has a non-finite value for {}",
                name, period
            )));
        }
        self.events
            .entry(name.to_string())
            .or_default()
            .insert(period, value);
        Ok(())
    }

    /// Builder form of [`EventCalendar::insert`] flagging each period with 1.0
    pub fn with_event(mut self, name: &str, periods: &[MonthPeriod]) -> Result<Self> {
        for period in periods {
            self.insert(name, *period, 1.0)?;
        }
        Ok(self)
    }

    /// Flag the same calendar month in every year from `start` through `end`
    pub fn with_annual_event(
        self,
        name: &str,
        month: u32,
        start: MonthPeriod,
        end: MonthPeriod,
    ) -> Result<Self> {
        let mut periods = Vec::new();
        for year in start.year()..=end.year() {
            let period = MonthPeriod::new(year, month)?;
            if period >= start && period <= end {
                periods.push(period);
            }
        }
        self.with_event(name, &periods)
    }

    /// Value of `name` in `period`, 0 when absent
    pub fn value(&self, name: &str, period: &MonthPeriod) -> f64 {
        self.events
            .get(name)
            .and_then(|by_period| by_period.get(period))
            .copied()
            .unwrap_or(0.0)
    }

    /// Event names in a stable order
    pub fn names(&self) -> Vec<&str> {
        self.events.keys().map(String::as_str).collect()
    }

    /// Reject non-finite values (used after deserialization)
    pub fn validate(&self) -> Result<()> {
        for (name, by_period) in &self.events {
            if let Some((period, _)) = by_period.iter().find(|(_, v)| !v.is_finite()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Event '{}' has a non-finite value for {}",
                    name, period
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_default_to_zero() {
        let nov = MonthPeriod::new(2022, 11).unwrap();
        let calendar = EventCalendar::new().with_event("black_friday", &[nov]).unwrap();

        assert_eq!(calendar.value("black_friday", &nov), 1.0);
        assert_eq!(calendar.value("black_friday", &nov.succ()), 0.0);
        assert_eq!(calendar.value("unknown", &nov), 0.0);
        assert_eq!(calendar.names(), vec!["black_friday"]);
    }

    #[test]
    fn test_annual_event() {
        let start = MonthPeriod::new(2020, 6).unwrap();
        let end = MonthPeriod::new(2022, 3).unwrap();
        let calendar = EventCalendar::new()
            .with_annual_event("holiday_season", 12, start, end)
            .unwrap();

        for year in 2020..=2021 {
            let dec = MonthPeriod::new(year, 12).unwrap();
            assert_eq!(calendar.value("holiday_season", &dec), 1.0);
        }
        let dec_2022 = MonthPeriod::new(2022, 12).unwrap();
        assert_eq!(calendar.value("holiday_season", &dec_2022), 0.0);
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut calendar = EventCalendar::new();
        let period = MonthPeriod::new(2022, 1).unwrap();
        assert!(calendar.insert("promo", period, f64::INFINITY).is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let calendar: EventCalendar =
            serde_json::from_str(r#"{"promo": {"2023-05": 1.0, "2024-05": 0.5}}"#).unwrap();
        let may = MonthPeriod::new(2024, 5).unwrap();
        assert_eq!(calendar.value("promo", &may), 0.5);
        assert!(calendar.validate().is_ok());
    }
}
