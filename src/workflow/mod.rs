//! Batch workflows: train, predict, evaluate.

mod evaluate;
mod predict;
mod train;

pub use evaluate::{evaluate, EvaluationReport};
pub use predict::predict;
pub use train::train;

use crate::config::Config;
use crate::features::news::{NewsFeatureBlock, NewsKey};
use crate::features::table::{FeatureTable, TableError};
use chrono::NaiveDate;

/// Engineered columns excluded from the model feature set: raw prices,
/// intermediate series, and the targets themselves.
pub(crate) const NON_FEATURE_COLS: &[&str] = &[
    "open",
    "high",
    "low",
    "close",
    "r1",
    "range",
    "target_r1",
    "target_R20",
    "label_up_1",
    "label_up_20",
];

/// Base numeric columns every fitted or predicted row must define.
pub(crate) fn base_columns(cfg: &Config) -> Vec<String> {
    let mut cols: Vec<String> = (1..=cfg.price_lags)
        .map(|k| format!("r1_lag{}", k))
        .collect();
    for &w in &cfg.roll_windows {
        cols.push(format!("r1_roll_mean_{}", w));
        cols.push(format!("r1_roll_std_{}", w));
        cols.push(format!("range_roll_mean_{}", w));
    }
    cols.push("volume".to_string());
    cols
}

/// Silently drop rows lacking the history to define every base column.
pub(crate) fn drop_undefined_rows(
    table: &mut FeatureTable,
    base: &[String],
) -> Result<(), TableError> {
    let mut keep = vec![true; table.n_rows()];
    for name in base {
        for (i, v) in table.column(name)?.iter().enumerate() {
            if v.is_none() {
                keep[i] = false;
            }
        }
    }
    table.retain_rows(&keep)
}

/// Collect the row indices and (ticker, date) keys of rows on or before the
/// cutoff; `None` takes every row.
pub(crate) fn keys_up_to(
    table: &FeatureTable,
    cutoff: Option<NaiveDate>,
) -> (Vec<usize>, Vec<NewsKey>) {
    let mut rows = Vec::new();
    let mut keys = Vec::new();
    for (i, (ticker, date)) in table.tickers().iter().zip(table.dates()).enumerate() {
        if cutoff.map_or(true, |c| *date <= c) {
            rows.push(i);
            keys.push((ticker.clone(), *date));
        }
    }
    (rows, keys)
}

/// Merge a news block into the table. Rows outside the requested key set get
/// zero-valued news columns, so the row count never changes.
pub(crate) fn merge_news_block(
    table: &mut FeatureTable,
    key_rows: &[usize],
    block: &NewsFeatureBlock,
) -> Result<(), TableError> {
    for (j, name) in block.names.iter().enumerate() {
        let mut values = vec![Some(0.0); table.n_rows()];
        for (i, &row) in key_rows.iter().enumerate() {
            values[row] = Some(block.rows[i][j]);
        }
        table.add_column(name, values)?;
    }
    Ok(())
}
