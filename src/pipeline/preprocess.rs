//! Shared preprocessing: standardized numerics plus a one-hot ticker block.

use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for the preprocessing transforms
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("transformer has not been fitted yet")]
    NotFitted,

    #[error("dimension mismatch: expected {expected} columns, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cannot fit on an empty dataset")]
    EmptyInput,

    #[error("failed to assemble the design matrix: {0}")]
    Shape(String),
}

/// Standardizes columns to zero mean and unit variance, with statistics
/// fitted on training data only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<(), PreprocessError> {
        if x.nrows() == 0 {
            return Err(PreprocessError::EmptyInput);
        }
        self.mean = x.mean_axis(Axis(0));
        self.std = Some(x.std_axis(Axis(0), 0.0));
        Ok(())
    }

    /// Standardize columns; zero-variance columns map to zero.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, PreprocessError> {
        let mean = self.mean.as_ref().ok_or(PreprocessError::NotFitted)?;
        let std = self.std.as_ref().ok_or(PreprocessError::NotFitted)?;
        if x.ncols() != mean.len() {
            return Err(PreprocessError::DimensionMismatch {
                expected: mean.len(),
                got: x.ncols(),
            });
        }

        let mut result = Array2::zeros(x.raw_dim());
        for (j, mut col) in result.columns_mut().into_iter().enumerate() {
            let m = mean[j];
            let s = std[j];
            for (i, val) in col.iter_mut().enumerate() {
                *val = if s > 1e-10 { (x[[i, j]] - m) / s } else { 0.0 };
            }
        }
        Ok(result)
    }
}

/// One-hot encodes a categorical column. Categories unseen at fit time
/// encode to an all-zero row rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit(&mut self, values: &[String]) {
        let mut categories: Vec<String> = values.to_vec();
        categories.sort_unstable();
        categories.dedup();
        self.categories = categories;
    }

    pub fn n_categories(&self) -> usize {
        self.categories.len()
    }

    pub fn transform(&self, values: &[String]) -> Array2<f64> {
        let mut out = Array2::zeros((values.len(), self.categories.len()));
        for (i, value) in values.iter().enumerate() {
            if let Ok(j) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                out[[i, j]] = 1.0;
            }
        }
        out
    }
}

/// The shared preprocessing transform: scaled numerics concatenated with the
/// one-hot categorical block. Each pipeline head owns its own fitted copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preprocessor {
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl Preprocessor {
    pub fn fit(&mut self, num: &Array2<f64>, cats: &[String]) -> Result<(), PreprocessError> {
        self.scaler.fit(num)?;
        self.encoder.fit(cats);
        Ok(())
    }

    pub fn transform(
        &self,
        num: &Array2<f64>,
        cats: &[String],
    ) -> Result<Array2<f64>, PreprocessError> {
        if num.nrows() != cats.len() {
            return Err(PreprocessError::DimensionMismatch {
                expected: num.nrows(),
                got: cats.len(),
            });
        }
        let scaled = self.scaler.transform(num)?;
        let onehot = self.encoder.transform(cats);
        concatenate(Axis(1), &[scaled.view(), onehot.view()])
            .map_err(|e| PreprocessError::Shape(e.to_string()))
    }
}
