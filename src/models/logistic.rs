//! Logistic regression for binary direction classification.
//!
//! Full-batch gradient descent with L2 regularization. Weight
//! initialization draws from a generator seeded by the explicit seed the
//! pipeline threads through, so a fixed seed reproduces the fit exactly.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for logistic regression
#[derive(Debug, Error)]
pub enum LogisticError {
    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cannot fit on an empty dataset")]
    EmptyInput,
}

/// Logistic regression classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// L2 regularization strength
    l2: f64,
    /// Learning rate
    learning_rate: f64,
    /// Maximum iterations
    max_iter: usize,
    /// Convergence tolerance on the loss
    tolerance: f64,
    /// Seed for weight initialization
    seed: u64,
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Intercept term
    pub intercept: Option<f64>,
}

impl LogisticRegression {
    /// Create a new classifier with the given L2 strength and seed.
    pub fn new(l2: f64, seed: u64) -> Self {
        Self {
            l2,
            learning_rate: 0.1,
            max_iter: 1000,
            tolerance: 1e-7,
            seed,
            coefficients: None,
            intercept: None,
        }
    }

    /// Numerically stable sigmoid.
    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let exp_z = z.exp();
            exp_z / (1.0 + exp_z)
        }
    }

    /// Binary cross-entropy.
    fn log_loss(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let eps = 1e-15;
        let n = y_true.len() as f64;

        -y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&y, &p)| {
                let p_clipped = p.clamp(eps, 1.0 - eps);
                y * p_clipped.ln() + (1.0 - y) * (1.0 - p_clipped).ln()
            })
            .sum::<f64>()
            / n
    }

    /// Fit using full-batch gradient descent.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), LogisticError> {
        if x.nrows() != y.len() {
            return Err(LogisticError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(LogisticError::EmptyInput);
        }

        let n_samples = x.nrows() as f64;
        let n_features = x.ncols();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut weights = Array1::from_shape_fn(n_features, |_| rng.gen_range(-1e-3..1e-3));
        let mut bias = 0.0;
        let mut prev_cost = f64::INFINITY;

        for _ in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = linear.mapv(Self::sigmoid);

            let errors = &predictions - y;
            let mut dw = x.t().dot(&errors) / n_samples;
            dw = &dw + &(&weights * self.l2);
            let db = errors.sum() / n_samples;

            weights = &weights - &(&dw * self.learning_rate);
            bias -= self.learning_rate * db;

            let cost = Self::log_loss(y, &predictions);
            if (prev_cost - cost).abs() < self.tolerance {
                break;
            }
            prev_cost = cost;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);

        Ok(())
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, LogisticError> {
        let weights = self.coefficients.as_ref().ok_or(LogisticError::NotFitted)?;
        let bias = self.intercept.ok_or(LogisticError::NotFitted)?;

        if x.ncols() != weights.len() {
            return Err(LogisticError::DimensionMismatch {
                expected: weights.len(),
                got: x.ncols(),
            });
        }

        let linear = x.dot(weights) + bias;
        Ok(linear.mapv(Self::sigmoid))
    }

    /// Predict class labels (0 or 1).
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, LogisticError> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert!((LogisticRegression::sigmoid(0.0) - 0.5).abs() < 1e-10);
        assert!(LogisticRegression::sigmoid(100.0) > 0.99);
        assert!(LogisticRegression::sigmoid(-100.0) < 0.01);
    }

    #[test]
    fn test_separable_data_classified() {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 5.0, 5.0, 5.5, 5.5, 6.0, 6.0],
        )
        .unwrap();
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

        let mut model = LogisticRegression::new(0.0, 7);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(&p, &t)| (p - t).abs() < 0.5)
            .count();
        assert!(correct >= 5);
    }

    #[test]
    fn test_probabilities_bounded() {
        let x = Array2::from_shape_vec((4, 1), vec![-2.0, -1.0, 1.0, 2.0]).unwrap();
        let y = Array1::from_vec(vec![0.0, 0.0, 1.0, 1.0]);

        let mut model = LogisticRegression::new(1.0, 7);
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_same_seed_same_fit() {
        let x = Array2::from_shape_vec((4, 2), vec![0.0, 1.0, 1.0, 0.0, 2.0, 3.0, 3.0, 2.0])
            .unwrap();
        let y = Array1::from_vec(vec![0.0, 0.0, 1.0, 1.0]);

        let mut a = LogisticRegression::new(0.5, 42);
        let mut b = LogisticRegression::new(0.5, 42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.intercept, b.intercept);
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let model = LogisticRegression::new(1.0, 0);
        let x = Array2::zeros((1, 1));
        assert!(matches!(
            model.predict_proba(&x),
            Err(LogisticError::NotFitted)
        ));
    }
}
