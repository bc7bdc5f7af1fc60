//! Supervised models: regularized regression and classification.

mod logistic;
mod ridge;

pub use logistic::{LogisticError, LogisticRegression};
pub use ridge::{RidgeError, RidgeRegression};
