//! Ridge regression (L2-regularized least squares).
//!
//! Fitted by the closed-form solution β = (X'X + αI)⁻¹ X'y on centered
//! data, solved with a Cholesky decomposition and an iterative fallback.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for ridge regression
#[derive(Debug, Error)]
pub enum RidgeError {
    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid alpha value: {0}")]
    InvalidAlpha(f64),

    #[error("cannot fit on an empty dataset")]
    EmptyInput,
}

/// Ridge regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    /// Regularization strength
    alpha: f64,
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Intercept term
    pub intercept: Option<f64>,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    /// Create a new Ridge regression model
    ///
    /// # Arguments
    /// * `alpha` - Regularization strength (higher = more regularization)
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: None,
        }
    }

    /// Fit the model on centered data; the intercept absorbs the means.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), RidgeError> {
        if self.alpha < 0.0 {
            return Err(RidgeError::InvalidAlpha(self.alpha));
        }
        if x.nrows() != y.len() {
            return Err(RidgeError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }

        let x_mean = x.mean_axis(Axis(0)).ok_or(RidgeError::EmptyInput)?;
        let y_mean = y.mean().ok_or(RidgeError::EmptyInput)?;
        let x_centered = x - &x_mean;
        let y_centered = y - y_mean;

        let n_features = x.ncols();
        let mut xtx = x_centered.t().dot(&x_centered);
        for i in 0..n_features {
            xtx[[i, i]] += self.alpha;
        }
        let xty = x_centered.t().dot(&y_centered);

        let coefficients = match cholesky_solve(&xtx, &xty) {
            Some(beta) => beta,
            None => gradient_solve(&xtx, &xty),
        };

        self.intercept = Some(y_mean - x_mean.dot(&coefficients));
        self.coefficients = Some(coefficients);

        Ok(())
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, RidgeError> {
        let coefficients = self.coefficients.as_ref().ok_or(RidgeError::NotFitted)?;
        let intercept = self.intercept.ok_or(RidgeError::NotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(RidgeError::DimensionMismatch {
                expected: coefficients.len(),
                got: x.ncols(),
            });
        }

        Ok(x.dot(coefficients) + intercept)
    }
}

/// Solve A x = b for symmetric positive-definite A via Cholesky. Returns
/// None when the decomposition breaks down.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    // A = L * L^T
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * z = b (forward substitution)
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = z (backward substitution)
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Iterative fallback for ill-conditioned systems.
fn gradient_solve(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = a.ncols();
    let mut x = Array1::<f64>::zeros(n);
    let learning_rate = 0.01;
    let max_iter = 1000;
    let tol = 1e-10;

    for _ in 0..max_iter {
        let residual = a.dot(&x) - b;
        let gradient = a.t().dot(&residual);

        let norm: f64 = gradient.iter().map(|&g| g * g).sum::<f64>().sqrt();
        if norm < tol {
            break;
        }

        x = &x - &(&gradient * learning_rate);
    }

    x
}
