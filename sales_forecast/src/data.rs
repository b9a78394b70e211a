//! Sales table loading, column mapping and monthly normalization

use crate::error::{ForecastError, Result, Stage};
use crate::period::MonthPeriod;
use crate::series::{MonthlyObservation, MonthlySeries};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// Share of non-null values that must parse for a column to count as dates
/// or numbers when it is chosen by content rather than by name
const CONTENT_MATCH_RATIO: f64 = 0.8;

/// chrono's `%Y` accepts any digit count, so a four-digit layout would read
/// "01/15/23" as the year 23. Years below this are left to the `%y` layout.
const MIN_FULL_YEAR: i32 = 100;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Data loader for raw sales tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a sales table from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .with_encoding(CsvEncoding::LossyUtf8)
            .finish()?;

        debug!(rows = df.height(), columns = df.width(), "loaded sales table");
        Ok(df)
    }
}

/// Explicit column names supplied by the user; they win over heuristics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOverrides {
    pub date: Option<String>,
    pub value: Option<String>,
    pub category: Option<String>,
}

/// Keyword tables used to pick columns when no explicit name is given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingRules {
    pub date_keywords: Vec<String>,
    pub value_keywords: Vec<String>,
}

impl Default for MappingRules {
    fn default() -> Self {
        Self {
            date_keywords: ["date", "time", "period", "month"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            value_keywords: ["sale", "rev", "amount", "total", "value"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Resolved mapping of table columns onto the canonical schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub value: String,
    pub category: Option<String>,
}

impl MappingRules {
    /// Resolve the column mapping for `df`.
    ///
    /// Order of preference for the date column: explicit override, first
    /// keyword-named column whose values parse as dates, first column whose
    /// content is mostly dates. For the value column: explicit override,
    /// first keyword-named numeric column, last numeric column.
    pub fn resolve(&self, df: &DataFrame, overrides: &ColumnOverrides) -> Result<ColumnMapping> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let category = match &overrides.category {
            Some(name) => Some(require_column(&names, name, "category")?),
            None => None,
        };

        let date = match &overrides.date {
            Some(name) => require_column(&names, name, "date")?,
            None => self.infer_date_column(df, &names)?,
        };

        let value = match &overrides.value {
            Some(name) => require_column(&names, name, "value")?,
            None => self.infer_value_column(df, &names, &date, category.as_deref())?,
        };

        if value == date {
            return Err(ForecastError::schema(
                Stage::Normalizer,
                format!("Column '{}' cannot be both the date and the value", date),
            ));
        }

        Ok(ColumnMapping {
            date,
            value,
            category,
        })
    }

    fn infer_date_column(&self, df: &DataFrame, names: &[String]) -> Result<String> {
        for name in names {
            if matches_keyword(name, &self.date_keywords)
                && date_match_ratio(df.column(name)?)? > 0.0
            {
                return Ok(name.clone());
            }
        }

        for name in names {
            let column = df.column(name)?;
            if column.dtype().is_temporal() || date_match_ratio(column)? >= CONTENT_MATCH_RATIO {
                return Ok(name.clone());
            }
        }

        Err(ForecastError::schema(
            Stage::Normalizer,
            "No date-like column found in data",
        ))
    }

    fn infer_value_column(
        &self,
        df: &DataFrame,
        names: &[String],
        date: &str,
        category: Option<&str>,
    ) -> Result<String> {
        let candidates: Vec<&String> = names
            .iter()
            .filter(|name| name.as_str() != date && Some(name.as_str()) != category)
            .collect();

        for name in &candidates {
            if matches_keyword(name, &self.value_keywords) && is_numeric_like(df.column(name)?)? {
                return Ok(name.to_string());
            }
        }

        for name in candidates.iter().rev() {
            if is_numeric_like(df.column(name)?)? {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::schema(
            Stage::Normalizer,
            "No numeric sales column found in data",
        ))
    }
}

fn require_column(names: &[String], name: &str, role: &str) -> Result<String> {
    if names.iter().any(|n| n == name) {
        Ok(name.to_string())
    } else {
        Err(ForecastError::schema(
            Stage::Normalizer,
            format!("Configured {} column '{}' not found in data", role, name),
        ))
    }
}

fn matches_keyword(name: &str, keywords: &[String]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

/// Parse a date in any of the accepted layouts
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            if full_year(&date, format) {
                return Some(date);
            }
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            if full_year(&datetime.date(), format) {
                return Some(datetime.date());
            }
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    // Month-only values such as "2023-04"
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return full_year(&date, "%Y").then_some(date);
    }
    // Datetimes with fractional seconds or offsets: keep the date part
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .filter(|date| full_year(date, "%Y"))
}

fn full_year(date: &NaiveDate, format: &str) -> bool {
    !format.contains("%Y") || date.year() >= MIN_FULL_YEAR
}

/// Parse a sales amount, tolerating currency symbols and thousands separators
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn date_values(column: &Series) -> Result<Vec<Option<NaiveDate>>> {
    let as_text = column.cast(&DataType::Utf8)?;
    Ok(as_text
        .utf8()?
        .into_iter()
        .map(|value| value.and_then(parse_date))
        .collect())
}

fn amount_values(column: &Series) -> Result<Vec<Option<f64>>> {
    if matches!(column.dtype(), DataType::Utf8) {
        return Ok(column
            .utf8()?
            .into_iter()
            .map(|value| value.and_then(parse_amount))
            .collect());
    }
    let as_float = column.cast(&DataType::Float64)?;
    Ok(as_float.f64()?.into_iter().collect())
}

fn category_values(column: &Series) -> Result<Vec<Option<String>>> {
    let as_text = column.cast(&DataType::Utf8)?;
    Ok(as_text
        .utf8()?
        .into_iter()
        .map(|value| value.map(|v| v.trim().to_string()))
        .collect())
}

fn date_match_ratio(column: &Series) -> Result<f64> {
    let non_null = column.len() - column.null_count();
    if non_null == 0 {
        return Ok(0.0);
    }
    let parsed = date_values(column)?.iter().flatten().count();
    Ok(parsed as f64 / non_null as f64)
}

fn is_numeric_like(column: &Series) -> Result<bool> {
    if column.dtype().is_numeric() {
        return Ok(true);
    }
    if !matches!(column.dtype(), DataType::Utf8) {
        return Ok(false);
    }
    let non_null = column.len() - column.null_count();
    if non_null == 0 {
        return Ok(false);
    }
    let parsed = amount_values(column)?.iter().flatten().count();
    Ok(parsed as f64 / non_null as f64 >= CONTENT_MATCH_RATIO)
}

/// Normalizer output: monthly totals per category over one contiguous range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSales {
    mapping: ColumnMapping,
    observations: Vec<MonthlyObservation>,
    rows_read: usize,
    rows_dropped: usize,
}

impl NormalizedSales {
    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Observations ordered by period, then category
    pub fn observations(&self) -> &[MonthlyObservation] {
        &self.observations
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Rows discarded because the date or value did not parse
    pub fn rows_dropped(&self) -> usize {
        self.rows_dropped
    }

    /// Distinct categories (empty when no category column was mapped)
    pub fn categories(&self) -> Vec<&str> {
        let unique: BTreeSet<&str> = self
            .observations
            .iter()
            .filter_map(|o| o.category.as_deref())
            .collect();
        unique.into_iter().collect()
    }

    /// Sum across categories into a single series.
    ///
    /// A month counts as filled only when every category was filled.
    pub fn total(&self) -> Result<MonthlySeries> {
        let mut by_period: BTreeMap<MonthPeriod, (f64, bool)> = BTreeMap::new();
        for observation in &self.observations {
            let entry = by_period.entry(observation.period).or_insert((0.0, true));
            entry.0 += observation.amount;
            entry.1 &= observation.filled;
        }

        let observations = by_period
            .into_iter()
            .map(|(period, (amount, filled))| MonthlyObservation {
                period,
                amount,
                category: None,
                filled,
            })
            .collect();
        MonthlySeries::new(observations)
    }

    /// The series of a single category
    pub fn series_for(&self, category: &str) -> Result<MonthlySeries> {
        let observations: Vec<MonthlyObservation> = self
            .observations
            .iter()
            .filter(|o| o.category.as_deref() == Some(category))
            .cloned()
            .collect();
        if observations.is_empty() {
            return Err(ForecastError::schema(
                Stage::Normalizer,
                format!("Unknown category '{}'", category),
            ));
        }
        MonthlySeries::new(observations)
    }
}

/// Maps a raw sales table onto monthly observations
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: MappingRules,
    overrides: ColumnOverrides,
    categories: Vec<String>,
}

impl Normalizer {
    pub fn new(rules: MappingRules, overrides: ColumnOverrides) -> Self {
        Self {
            rules,
            overrides,
            categories: Vec::new(),
        }
    }

    /// Keep only rows in these categories (ignored without a category column)
    pub fn with_category_filter(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Resolve the mapping, aggregate rows to calendar months and zero-fill gaps
    pub fn normalize(&self, df: &DataFrame) -> Result<NormalizedSales> {
        let mapping = self.rules.resolve(df, &self.overrides)?;
        info!(
            date = %mapping.date,
            value = %mapping.value,
            category = ?mapping.category,
            "resolved column mapping"
        );

        let dates = date_values(df.column(&mapping.date)?)?;
        let amounts = amount_values(df.column(&mapping.value)?)?;
        let categories = match &mapping.category {
            Some(name) => category_values(df.column(name)?)?,
            None => vec![None; df.height()],
        };

        let mut totals: BTreeMap<(MonthPeriod, Option<String>), f64> = BTreeMap::new();
        let mut rows_dropped = 0;
        for ((date, amount), category) in dates.iter().zip(&amounts).zip(categories) {
            let (date, amount) = match (date, amount) {
                (Some(date), Some(amount)) => (*date, *amount),
                _ => {
                    rows_dropped += 1;
                    continue;
                }
            };
            if !amount.is_finite() {
                return Err(ForecastError::numeric(
                    Stage::Normalizer,
                    format!("Non-finite sales value on {}", date),
                ));
            }
            if mapping.category.is_some() && !self.categories.is_empty() {
                let keep = category
                    .as_ref()
                    .map(|c| self.categories.iter().any(|wanted| wanted == c))
                    .unwrap_or(false);
                if !keep {
                    continue;
                }
            }
            *totals
                .entry((MonthPeriod::from_date(date), category))
                .or_insert(0.0) += amount;
        }

        if rows_dropped > 0 {
            warn!(rows_dropped, "dropped rows with unparseable date or value");
        }

        let (first, last) = match (totals.keys().next(), totals.keys().next_back()) {
            (Some((first, _)), Some((last, _))) => (*first, *last),
            _ => {
                return Err(ForecastError::schema(
                    Stage::Normalizer,
                    "No usable rows after parsing dates and values",
                ))
            }
        };
        let categories: BTreeSet<Option<String>> =
            totals.keys().map(|(_, category)| category.clone()).collect();

        let mut observations = Vec::new();
        for period in first.range_inclusive(&last) {
            for category in &categories {
                let observation = match totals.get(&(period, category.clone())) {
                    Some(&amount) if amount < 0.0 => {
                        return Err(ForecastError::numeric(
                            Stage::Normalizer,
                            format!("Monthly total for {} is negative ({})", period, amount),
                        ))
                    }
                    Some(&amount) => MonthlyObservation {
                        period,
                        amount,
                        category: category.clone(),
                        filled: false,
                    },
                    None => MonthlyObservation {
                        period,
                        amount: 0.0,
                        category: category.clone(),
                        filled: true,
                    },
                };
                observations.push(observation);
            }
        }

        let filled = observations.iter().filter(|o| o.filled).count();
        info!(
            months = first.months_until(&last) + 1,
            categories = categories.len(),
            filled,
            "normalized sales to monthly totals"
        );

        Ok(NormalizedSales {
            mapping,
            observations,
            rows_read: df.height(),
            rows_dropped,
        })
    }
}
