//! A fitted preprocessing transform paired with one predictor head.

use crate::models::{LogisticError, LogisticRegression, RidgeError, RidgeRegression};
use crate::pipeline::preprocess::{PreprocessError, Preprocessor};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for the model pipelines
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Ridge(#[from] RidgeError),

    #[error(transparent)]
    Logistic(#[from] LogisticError),

    #[error("pipeline head does not produce probabilities")]
    NotAClassifier,
}

/// The predictor at the end of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PredictorHead {
    Ridge(RidgeRegression),
    Logistic(LogisticRegression),
}

/// One preprocessing copy plus one predictor head, fitted together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPipeline {
    preprocessor: Preprocessor,
    head: PredictorHead,
}

impl ModelPipeline {
    /// A ridge regression pipeline.
    pub fn ridge(alpha: f64) -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            head: PredictorHead::Ridge(RidgeRegression::new(alpha)),
        }
    }

    /// A logistic classification pipeline.
    pub fn logistic(l2: f64, seed: u64) -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            head: PredictorHead::Logistic(LogisticRegression::new(l2, seed)),
        }
    }

    /// Fit the preprocessing statistics and the head on training data.
    pub fn fit(
        &mut self,
        num: &Array2<f64>,
        cats: &[String],
        y: &Array1<f64>,
    ) -> Result<(), PipelineError> {
        self.preprocessor.fit(num, cats)?;
        let x = self.preprocessor.transform(num, cats)?;
        match &mut self.head {
            PredictorHead::Ridge(model) => model.fit(&x, y)?,
            PredictorHead::Logistic(model) => model.fit(&x, y)?,
        }
        Ok(())
    }

    /// Point predictions: regression values, or class labels for a
    /// classification head.
    pub fn predict(&self, num: &Array2<f64>, cats: &[String]) -> Result<Array1<f64>, PipelineError> {
        let x = self.preprocessor.transform(num, cats)?;
        let out = match &self.head {
            PredictorHead::Ridge(model) => model.predict(&x)?,
            PredictorHead::Logistic(model) => model.predict(&x)?,
        };
        Ok(out)
    }

    /// Positive-class probabilities; errors for a regression head.
    pub fn predict_proba(
        &self,
        num: &Array2<f64>,
        cats: &[String],
    ) -> Result<Array1<f64>, PipelineError> {
        let x = self.preprocessor.transform(num, cats)?;
        match &self.head {
            PredictorHead::Ridge(_) => Err(PipelineError::NotAClassifier),
            PredictorHead::Logistic(model) => Ok(model.predict_proba(&x)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Array2<f64>, Vec<String>, Array1<f64>) {
        let num = Array2::from_shape_vec(
            (6, 1),
            vec![-3.0, -2.0, -1.0, 1.0, 2.0, 3.0],
        )
        .unwrap();
        let cats: Vec<String> = ["A", "A", "B", "B", "A", "B"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let y = Array1::from_vec(vec![-3.0, -2.0, -1.0, 1.0, 2.0, 3.0]);
        (num, cats, y)
    }

    #[test]
    fn test_ridge_pipeline_fit_predict() {
        let (num, cats, y) = toy_data();
        let mut pipe = ModelPipeline::ridge(1e-6);
        pipe.fit(&num, &cats, &y).unwrap();

        let pred = pipe.predict(&num, &cats).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 0.1);
        }
    }

    #[test]
    fn test_logistic_pipeline_proba() {
        let (num, cats, _) = toy_data();
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let mut pipe = ModelPipeline::logistic(0.1, 11);
        pipe.fit(&num, &cats, &y).unwrap();

        let proba = pipe.predict_proba(&num, &cats).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!(proba[0] < 0.5);
        assert!(proba[5] > 0.5);
    }

    #[test]
    fn test_unseen_category_still_predicts() {
        let (num, cats, y) = toy_data();
        let mut pipe = ModelPipeline::ridge(1.0);
        pipe.fit(&num, &cats, &y).unwrap();

        let unseen: Vec<String> = vec!["ZZZ".to_string()];
        let one = Array2::from_shape_vec((1, 1), vec![0.5]).unwrap();
        assert!(pipe.predict(&one, &unseen).is_ok());
    }

    #[test]
    fn test_proba_on_regressor_errors() {
        let (num, cats, y) = toy_data();
        let mut pipe = ModelPipeline::ridge(1.0);
        pipe.fit(&num, &cats, &y).unwrap();

        assert!(matches!(
            pipe.predict_proba(&num, &cats),
            Err(PipelineError::NotAClassifier)
        ));
    }
}
