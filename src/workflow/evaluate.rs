//! Forecast evaluation against realized outcomes.

use anyhow::{ensure, Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Accuracy metrics for the two forecast horizons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(rename = "MAE_1")]
    pub mae_1: f64,
    #[serde(rename = "MAE_20")]
    pub mae_20: f64,
    #[serde(rename = "Brier_1")]
    pub brier_1: f64,
    #[serde(rename = "Brier_20")]
    pub brier_20: f64,
    #[serde(rename = "DA_1")]
    pub da_1: f64,
    #[serde(rename = "DA_20")]
    pub da_20: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastRecord {
    date: NaiveDate,
    ticker: String,
    r1_pred: f64,
    #[serde(rename = "R20_pred")]
    r20_pred: f64,
    p_up_1: f64,
    p_up_20: f64,
}

#[derive(Debug, Deserialize)]
struct TruthRecord {
    date: NaiveDate,
    ticker: String,
    r1_true: f64,
    #[serde(rename = "R20_true")]
    r20_true: f64,
}

/// Inner-join forecasts and ground truth on (date, ticker) and score them.
/// Rows present in only one table are silently excluded.
pub fn evaluate(pred_csv: &Path, truth_csv: &Path) -> Result<EvaluationReport> {
    let forecasts: Vec<ForecastRecord> = read_records(pred_csv)?;
    let truth: Vec<TruthRecord> = read_records(truth_csv)?;

    let by_key: HashMap<(NaiveDate, &str), &ForecastRecord> = forecasts
        .iter()
        .map(|f| ((f.date, f.ticker.as_str()), f))
        .collect();

    let joined: Vec<(&TruthRecord, &ForecastRecord)> = truth
        .iter()
        .filter_map(|t| by_key.get(&(t.date, t.ticker.as_str())).map(|f| (t, *f)))
        .collect();
    ensure!(
        !joined.is_empty(),
        "no overlapping (date, ticker) keys between predictions and truth"
    );

    Ok(EvaluationReport {
        mae_1: mean_absolute_error(joined.iter().map(|(t, f)| (t.r1_true, f.r1_pred))),
        mae_20: mean_absolute_error(joined.iter().map(|(t, f)| (t.r20_true, f.r20_pred))),
        brier_1: brier_score(joined.iter().map(|(t, f)| (t.r1_true, f.p_up_1))),
        brier_20: brier_score(joined.iter().map(|(t, f)| (t.r20_true, f.p_up_20))),
        da_1: directional_accuracy(joined.iter().map(|(t, f)| (t.r1_true, f.r1_pred))),
        da_20: directional_accuracy(joined.iter().map(|(t, f)| (t.r20_true, f.r20_pred))),
    })
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("failed to open {:?}", path))?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result.with_context(|| format!("bad record in {:?}", path))?);
    }
    Ok(records)
}

/// Mean absolute error: (1/n) * Σ|y_true - y_pred|
fn mean_absolute_error(pairs: impl ExactSizeIterator<Item = (f64, f64)>) -> f64 {
    let n = pairs.len() as f64;
    pairs.map(|(t, p)| (t - p).abs()).sum::<f64>() / n
}

/// Mean squared error between the up-probability and the realized label,
/// with the label taken as (true value > 0).
fn brier_score(pairs: impl ExactSizeIterator<Item = (f64, f64)>) -> f64 {
    let n = pairs.len() as f64;
    pairs
        .map(|(t, p)| {
            let label = if t > 0.0 { 1.0 } else { 0.0 };
            (p - label).powi(2)
        })
        .sum::<f64>()
        / n
}

/// Fraction of rows whose predicted sign matches the realized sign. A zero
/// value only matches another zero.
fn directional_accuracy(pairs: impl ExactSizeIterator<Item = (f64, f64)>) -> f64 {
    let n = pairs.len() as f64;
    pairs.filter(|&(t, p)| sign(t) == sign(p)).count() as f64 / n
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}
