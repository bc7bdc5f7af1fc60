//! Artifact persistence.
//!
//! A training run leaves behind four fitted pipelines, the fitted text
//! vectorizer when news was used, and a metadata record with the split
//! boundaries, the exact column lists, and the config snapshot. The
//! Predictor reloads all of it read-only.

use crate::config::Config;
use crate::nlp::TfIdf;
use crate::pipeline::pipeline::ModelPipeline;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

const PIPE_R1_FILE: &str = "pipe_r1.json";
const PIPE_R20_FILE: &str = "pipe_R20.json";
const PIPE_UP1_FILE: &str = "pipe_up1.json";
const PIPE_UP20_FILE: &str = "pipe_up20.json";
const VECTORIZER_FILE: &str = "vectorizer.json";
const META_FILE: &str = "meta.json";

/// Metadata persisted next to the fitted pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Last date of the training split (inclusive)
    pub t0: NaiveDate,
    /// Last date of the validation split (inclusive)
    pub t1: NaiveDate,
    /// Numeric feature columns, in design-matrix order
    pub num_cols: Vec<String>,
    /// Categorical feature columns
    pub cat_cols: Vec<String>,
    /// Config snapshot used for feature construction
    pub config: Config,
}

/// The four forecast heads plus the optional fitted vectorizer.
#[derive(Debug)]
pub struct Artifacts {
    pub pipe_r1: ModelPipeline,
    pub pipe_r20: ModelPipeline,
    pub pipe_up1: ModelPipeline,
    pub pipe_up20: ModelPipeline,
    pub vectorizer: Option<TfIdf>,
}

impl Artifacts {
    /// Assemble the four untrained heads: two ridge regressors and two
    /// logistic classifiers, each owning its own preprocessing copy.
    pub fn build(seed: u64) -> Self {
        Self {
            pipe_r1: ModelPipeline::ridge(1.0),
            pipe_r20: ModelPipeline::ridge(1.0),
            pipe_up1: ModelPipeline::logistic(1.0, seed),
            pipe_up20: ModelPipeline::logistic(1.0, seed.wrapping_add(1)),
            vectorizer: None,
        }
    }

    /// Persist everything to `dir`, creating it if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P, meta: &Metadata) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create artifact directory {:?}", dir))?;

        write_json(&dir.join(PIPE_R1_FILE), &self.pipe_r1)?;
        write_json(&dir.join(PIPE_R20_FILE), &self.pipe_r20)?;
        write_json(&dir.join(PIPE_UP1_FILE), &self.pipe_up1)?;
        write_json(&dir.join(PIPE_UP20_FILE), &self.pipe_up20)?;
        if let Some(vectorizer) = &self.vectorizer {
            write_json(&dir.join(VECTORIZER_FILE), vectorizer)?;
        }
        write_json(&dir.join(META_FILE), meta)?;
        Ok(())
    }

    /// Reload a persisted artifact directory.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<(Self, Metadata)> {
        let dir = dir.as_ref();
        let vectorizer_path = dir.join(VECTORIZER_FILE);
        let vectorizer = if vectorizer_path.exists() {
            Some(read_json(&vectorizer_path)?)
        } else {
            None
        };

        let artifacts = Self {
            pipe_r1: read_json(&dir.join(PIPE_R1_FILE))?,
            pipe_r20: read_json(&dir.join(PIPE_R20_FILE))?,
            pipe_up1: read_json(&dir.join(PIPE_UP1_FILE))?,
            pipe_up20: read_json(&dir.join(PIPE_UP20_FILE))?,
            vectorizer,
        };
        let meta = read_json(&dir.join(META_FILE))?;
        Ok((artifacts, meta))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("failed to serialize {:?}", path))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    serde_json::from_reader(file).with_context(|| format!("failed to parse {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let num = Array2::from_shape_vec((4, 1), vec![-1.0, -0.5, 0.5, 1.0]).unwrap();
        let cats: Vec<String> = ["A", "A", "B", "B"].iter().map(|s| s.to_string()).collect();
        let y = Array1::from_vec(vec![-1.0, -0.5, 0.5, 1.0]);
        let labels = Array1::from_vec(vec![0.0, 0.0, 1.0, 1.0]);

        let mut artifacts = Artifacts::build(1337);
        artifacts.pipe_r1.fit(&num, &cats, &y).unwrap();
        artifacts.pipe_r20.fit(&num, &cats, &y).unwrap();
        artifacts.pipe_up1.fit(&num, &cats, &labels).unwrap();
        artifacts.pipe_up20.fit(&num, &cats, &labels).unwrap();

        let meta = Metadata {
            t0: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            t1: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            num_cols: vec!["volume".to_string()],
            cat_cols: vec!["ticker".to_string()],
            config: Config::default(),
        };

        let dir = tempdir().unwrap();
        artifacts.save(dir.path(), &meta).unwrap();

        for name in [PIPE_R1_FILE, PIPE_R20_FILE, PIPE_UP1_FILE, PIPE_UP20_FILE, META_FILE] {
            assert!(dir.path().join(name).exists(), "{} missing", name);
        }
        // no news at train time, so no vectorizer file
        assert!(!dir.path().join(VECTORIZER_FILE).exists());

        let (restored, restored_meta) = Artifacts::load(dir.path()).unwrap();
        assert_eq!(restored_meta.num_cols, meta.num_cols);
        assert_eq!(restored_meta.t0, meta.t0);

        let before = artifacts.pipe_r1.predict(&num, &cats).unwrap();
        let after = restored.pipe_r1.predict(&num, &cats).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
