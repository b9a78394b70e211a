//! Seeded synthetic monthly sales for demos and tests

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use crate::decomposition::SEASONAL_PERIOD;
use crate::error::{ForecastError, Result};
use crate::period::MonthPeriod;
use crate::series::MonthlySeries;

/// `base + slope * i + amplitude * sin(2 pi i / 12) + N(0, noise)`, floored at zero
#[derive(Debug, Clone)]
pub struct SyntheticSales {
    start: MonthPeriod,
    months: usize,
    base: f64,
    slope: f64,
    amplitude: f64,
    noise: f64,
    seed: u64,
}

impl SyntheticSales {
    pub fn new(start: MonthPeriod, months: usize) -> Self {
        Self {
            start,
            months,
            base: 10_000.0,
            slope: 50.0,
            amplitude: 1_500.0,
            noise: 0.0,
            seed: 42,
        }
    }

    pub fn base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn slope(mut self, slope: f64) -> Self {
        self.slope = slope;
        self
    }

    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Standard deviation of the Gaussian noise
    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate the monthly values
    pub fn values(&self) -> Result<Vec<f64>> {
        let normal = Normal::new(0.0, self.noise)
            .map_err(|e| ForecastError::InvalidParameter(format!("Invalid noise: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        Ok((0..self.months)
            .map(|i| {
                let season = self.amplitude * (2.0 * PI * i as f64 / SEASONAL_PERIOD as f64).sin();
                let value = self.base + self.slope * i as f64 + season + normal.sample(&mut rng);
                value.max(0.0)
            })
            .collect())
    }

    pub fn series(&self) -> Result<MonthlySeries> {
        MonthlySeries::from_values(self.start, &self.values()?)
    }

    /// The same values as a raw table with `Order Date` and `Sales` columns
    pub fn dataframe(&self) -> Result<DataFrame> {
        let values = self.values()?;
        let dates: Vec<String> = (0..values.len())
            .map(|i| {
                let period = self.start.offset(i as i64);
                format!("{:04}-{:02}-15", period.year(), period.month())
            })
            .collect();

        let df = df!(
            "Order Date" => dates,
            "Sales" => values,
        )?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_values() {
        let start = MonthPeriod::new(2020, 1).unwrap();
        let a = SyntheticSales::new(start, 36).noise(100.0).seed(7).values().unwrap();
        let b = SyntheticSales::new(start, 36).noise(100.0).seed(7).values().unwrap();
        let c = SyntheticSales::new(start, 36).noise(100.0).seed(8).values().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_noise_free_shape() {
        let values = SyntheticSales::new(MonthPeriod::new(2020, 1).unwrap(), 24)
            .base(100.0)
            .slope(1.0)
            .amplitude(10.0)
            .values()
            .unwrap();
        assert_eq!(values[0], 100.0);
        assert!((values[3] - 113.0).abs() < 1e-9);
    }

    #[test]
    fn test_dataframe_columns() {
        let df = SyntheticSales::new(MonthPeriod::new(2021, 3).unwrap(), 4)
            .dataframe()
            .unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(df.get_column_names(), vec!["Order Date", "Sales"]);
    }
}
