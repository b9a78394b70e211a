//! Regression implementations
//!
//! Contains:
//! - Simple linear regression over an evenly spaced index
//! - Multiple ordinary least squares with a small ridge term, keeping the
//!   inverse Gram matrix `(X'X)^-1` for prediction intervals

use serde::{Deserialize, Serialize};

use crate::{MathError, Result};

/// Ridge term added to the Gram diagonal before inversion
pub const DEFAULT_RIDGE: f64 = 1e-8;

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Linear regression of values against their index (0, 1, 2, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    slope: f64,
}

impl LinearRegression {
    /// Fit a straight line through `values` indexed from zero
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(MathError::InsufficientData(
                "Not enough data for linear regression. Need at least 2 points.".to_string(),
            ));
        }

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let x = i as f64;
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        Ok(Self {
            slope: numerator / denominator,
        })
    }

    /// Change per index step
    pub fn slope(&self) -> f64 {
        self.slope
    }
}

/// Result of an ordinary least squares fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeastSquares {
    coefficients: Vec<f64>,
    inverse_gram: Vec<Vec<f64>>,
    fitted: Vec<f64>,
    sum_squared_residuals: f64,
}

impl LeastSquares {
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    pub fn sum_squared_residuals(&self) -> f64 {
        self.sum_squared_residuals
    }

    /// Prediction `x'b` for a design row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        Ok(row
            .iter()
            .zip(&self.coefficients)
            .map(|(x, b)| x * b)
            .sum())
    }

    /// Quadratic form `x'(X'X)^-1 x` for a design row
    pub fn leverage(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        let mut total = 0.0;
        for (a, xa) in row.iter().enumerate() {
            for (b, xb) in row.iter().enumerate() {
                total += xa * self.inverse_gram[a][b] * xb;
            }
        }
        Ok(total.max(0.0))
    }

    fn check_row(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Design row has {} columns, model has {}",
                row.len(),
                self.coefficients.len()
            )));
        }
        Ok(())
    }
}

/// Fit `response ~ design` by ordinary least squares.
///
/// `design` is row-major, one row per observation. `ridge` is added to the
/// diagonal of `X'X` before inversion; pass [`DEFAULT_RIDGE`] for a plain
/// fit that stays stable on nearly collinear columns.
pub fn least_squares(design: &[Vec<f64>], response: &[f64], ridge: f64) -> Result<LeastSquares> {
    let n = design.len();
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Design matrix has no rows".to_string(),
        ));
    }
    if response.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but response has {} values",
            n,
            response.len()
        )));
    }
    let p = design[0].len();
    if p == 0 {
        return Err(MathError::InvalidInput(
            "Design matrix has no columns".to_string(),
        ));
    }
    if design.iter().any(|row| row.len() != p) {
        return Err(MathError::InvalidInput(
            "Design rows have differing lengths".to_string(),
        ));
    }
    if ridge < 0.0 || !ridge.is_finite() {
        return Err(MathError::InvalidInput(
            "Ridge term must be finite and non-negative".to_string(),
        ));
    }

    let mut gram = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &y) in design.iter().zip(response) {
        for a in 0..p {
            xty[a] += row[a] * y;
            for b in 0..p {
                gram[a][b] += row[a] * row[b];
            }
        }
    }
    for (d, gram_row) in gram.iter_mut().enumerate() {
        gram_row[d] += ridge;
    }

    let inverse_gram = invert(gram)?;
    let coefficients: Vec<f64> = inverse_gram
        .iter()
        .map(|inv_row| inv_row.iter().zip(&xty).map(|(a, b)| a * b).sum())
        .collect();

    let fitted: Vec<f64> = design
        .iter()
        .map(|row| row.iter().zip(&coefficients).map(|(x, b)| x * b).sum())
        .collect();
    let sum_squared_residuals = response
        .iter()
        .zip(&fitted)
        .map(|(y, f)| (y - f).powi(2))
        .sum();

    Ok(LeastSquares {
        coefficients,
        inverse_gram,
        fitted,
        sum_squared_residuals,
    })
}

/// Gauss-Jordan inversion with partial pivoting
fn invert(mut matrix: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
    let p = matrix.len();
    let mut inverse: Vec<Vec<f64>> = (0..p)
        .map(|i| (0..p).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot_row][col].abs() < PIVOT_TOLERANCE {
            return Err(MathError::CalculationError(format!(
                "Design matrix is singular at column {}",
                col
            )));
        }
        matrix.swap(col, pivot_row);
        inverse.swap(col, pivot_row);

        let pivot = matrix[col][col];
        for j in 0..p {
            matrix[col][j] /= pivot;
            inverse[col][j] /= pivot;
        }

        for row in 0..p {
            if row == col {
                continue;
            }
            let factor = matrix[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..p {
                matrix[row][j] -= factor * matrix[col][j];
                inverse[row][j] -= factor * inverse[col][j];
            }
        }
    }

    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_regression() {
        let lr = LinearRegression::fit(&[10.0, 20.0, 30.0]).unwrap();

        assert_relative_eq!(lr.slope(), 10.0, epsilon = 1e-9);

        let falling = LinearRegression::fit(&[5.0, 3.0, 1.0, -1.0]).unwrap();
        assert_relative_eq!(falling.slope(), -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_regression_needs_two_points() {
        assert!(matches!(
            LinearRegression::fit(&[1.0]),
            Err(MathError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_least_squares_recovers_coefficients() {
        // y = 3 + 2x1 - x2
        let design: Vec<Vec<f64>> = (0..10)
            .map(|i| {
                let x1 = i as f64;
                let x2 = (i * i % 7) as f64;
                vec![1.0, x1, x2]
            })
            .collect();
        let response: Vec<f64> = design.iter().map(|r| 3.0 + 2.0 * r[1] - r[2]).collect();

        let fit = least_squares(&design, &response, 0.0).unwrap();
        // Unit rows read off each coefficient
        assert_relative_eq!(fit.predict(&[1.0, 0.0, 0.0]).unwrap(), 3.0, epsilon = 1e-8);
        assert_relative_eq!(fit.predict(&[0.0, 1.0, 0.0]).unwrap(), 2.0, epsilon = 1e-8);
        assert_relative_eq!(fit.predict(&[0.0, 0.0, 1.0]).unwrap(), -1.0, epsilon = 1e-8);
        assert!(fit.sum_squared_residuals() < 1e-12);
        assert_eq!(fit.fitted().len(), 10);

        let prediction = fit.predict(&[1.0, 20.0, 4.0]).unwrap();
        assert_relative_eq!(prediction, 39.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_gram_matches_intercept_only_model() {
        // For an intercept-only model (X'X)^-1 = 1/n
        let design = vec![vec![1.0]; 4];
        let fit = least_squares(&design, &[1.0, 2.0, 3.0, 4.0], 0.0).unwrap();

        assert_relative_eq!(fit.predict(&[1.0]).unwrap(), 2.5, epsilon = 1e-12);
        assert_relative_eq!(fit.leverage(&[1.0]).unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(fit.leverage(&[2.0]).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_design_without_ridge() {
        let design = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]];
        let result = least_squares(&design, &[1.0, 2.0, 3.0], 0.0);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_shape_validation() {
        assert!(least_squares(&[], &[], 0.0).is_err());
        assert!(least_squares(&[vec![1.0]], &[1.0, 2.0], 0.0).is_err());
        assert!(least_squares(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0], 0.0).is_err());

        let fit = least_squares(&[vec![1.0], vec![1.0]], &[1.0, 1.0], 0.0).unwrap();
        assert!(fit.predict(&[1.0, 2.0]).is_err());
    }
}
