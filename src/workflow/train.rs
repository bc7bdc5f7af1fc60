//! Training workflow.
//!
//! Builds price features, optionally merges lag-aligned news features, fits
//! the four forecast heads on the training split, and persists artifacts.
//! Nothing is written until every fit has succeeded.

use crate::config::Config;
use crate::data::DataLoader;
use crate::features::{FeatureTable, NewsFeatureBuilder, PriceFeatureBuilder};
use crate::pipeline::{Artifacts, Metadata, ModelPipeline};
use crate::workflow::{
    base_columns, drop_undefined_rows, keys_up_to, merge_news_block, NON_FEATURE_COLS,
};
use anyhow::{ensure, Context, Result};
use chrono::NaiveDate;
use ndarray::Array1;
use std::path::Path;
use tracing::info;

/// Train all four heads and write artifacts to `outdir`.
///
/// `t0` is the last training date (inclusive); rows in (t0, t1] form the
/// validation split, used only for reporting.
pub fn train(
    candles_csv: &Path,
    news_csv: Option<&Path>,
    outdir: &Path,
    t0: NaiveDate,
    t1: NaiveDate,
    cfg: &Config,
) -> Result<()> {
    ensure!(t0 < t1, "t0 ({}) must precede t1 ({})", t0, t1);

    let loader = DataLoader::new(&cfg.date_col, &cfg.ticker_col);
    let candles = loader.load_candles(candles_csv)?;
    ensure!(!candles.is_empty(), "candle file contains no rows");
    info!("loaded {} candles", candles.len());

    let builder =
        PriceFeatureBuilder::new(cfg.price_lags, &cfg.roll_windows).with_n_jobs(cfg.n_jobs);
    let mut features = builder.build(&candles)?;

    let mut artifacts = Artifacts::build(cfg.seed);
    if let Some(news_path) = news_csv {
        let news = loader.load_news(news_path)?;
        info!("loaded {} news items", news.len());

        // the vectorizer sees news aligned to train + validation rows only
        let (key_rows, keys) = keys_up_to(&features, Some(t1));
        let news_builder = NewsFeatureBuilder::new(cfg.max_news_per_day, cfg.max_features);
        let (block, vectorizer) = news_builder.fit_build(&news, &keys);
        info!("news features: {} vocabulary terms", block.names.len());
        merge_news_block(&mut features, &key_rows, &block)?;
        artifacts.vectorizer = Some(vectorizer);
    }

    let num_cols = select_numeric_columns(&features, cfg);
    let cat_cols = vec![cfg.ticker_col.clone()];

    drop_undefined_rows(&mut features, &base_columns(cfg))?;
    info!(
        "{} feature rows after dropping insufficient history",
        features.n_rows()
    );

    let train_mask: Vec<bool> = features.dates().iter().map(|d| *d <= t0).collect();
    let val_mask: Vec<bool> = features
        .dates()
        .iter()
        .map(|d| *d > t0 && *d <= t1)
        .collect();

    let mut train_set = features.clone();
    train_set.retain_rows(&train_mask)?;
    let mut val_set = features;
    val_set.retain_rows(&val_mask)?;
    ensure!(train_set.n_rows() > 0, "no training rows on or before t0");
    info!(
        "split: {} train rows, {} validation rows",
        train_set.n_rows(),
        val_set.n_rows()
    );

    fit_head(&mut artifacts.pipe_r1, &train_set, &num_cols, "target_r1")?;
    fit_head(&mut artifacts.pipe_r20, &train_set, &num_cols, "target_R20")?;
    fit_head(&mut artifacts.pipe_up1, &train_set, &num_cols, "label_up_1")?;
    fit_head(&mut artifacts.pipe_up20, &train_set, &num_cols, "label_up_20")?;

    if val_set.n_rows() > 0 {
        report_validation(&artifacts, &val_set, &num_cols)?;
    }

    let meta = Metadata {
        t0,
        t1,
        num_cols,
        cat_cols,
        config: cfg.clone(),
    };
    artifacts.save(outdir, &meta)?;
    info!("artifacts written to {:?}", outdir);
    Ok(())
}

/// Every engineered numeric column outside the exclusion set, with the base
/// lag/rolling/volume columns guaranteed present.
fn select_numeric_columns(features: &FeatureTable, cfg: &Config) -> Vec<String> {
    let mut num_cols: Vec<String> = features
        .names()
        .iter()
        .filter(|name| !NON_FEATURE_COLS.contains(&name.as_str()))
        .cloned()
        .collect();
    for name in base_columns(cfg) {
        if !num_cols.contains(&name) && features.has_column(&name) {
            num_cols.push(name);
        }
    }
    num_cols
}

/// Fit one head on the rows where its target is defined.
fn fit_head(
    pipe: &mut ModelPipeline,
    table: &FeatureTable,
    num_cols: &[String],
    target: &str,
) -> Result<()> {
    let defined: Vec<bool> = table.column(target)?.iter().map(|v| v.is_some()).collect();
    let mut subset = table.clone();
    subset.retain_rows(&defined)?;
    ensure!(
        subset.n_rows() > 0,
        "no training rows with a defined {} target",
        target
    );

    let y: Array1<f64> = subset.column(target)?.iter().copied().flatten().collect();
    let num = subset.to_matrix(num_cols)?;
    pipe.fit(&num, subset.tickers(), &y)
        .with_context(|| format!("failed to fit the {} head", target))?;
    info!("fitted {} head on {} rows", target, subset.n_rows());
    Ok(())
}

/// Log held-out metrics for each head on the validation split.
fn report_validation(artifacts: &Artifacts, val: &FeatureTable, num_cols: &[String]) -> Result<()> {
    let heads: [(&ModelPipeline, &str, bool); 4] = [
        (&artifacts.pipe_r1, "target_r1", false),
        (&artifacts.pipe_r20, "target_R20", false),
        (&artifacts.pipe_up1, "label_up_1", true),
        (&artifacts.pipe_up20, "label_up_20", true),
    ];

    for (pipe, target, is_classifier) in heads {
        let defined: Vec<bool> = val.column(target)?.iter().map(|v| v.is_some()).collect();
        let mut subset = val.clone();
        subset.retain_rows(&defined)?;
        if subset.n_rows() == 0 {
            continue;
        }

        let y: Vec<f64> = subset.column(target)?.iter().copied().flatten().collect();
        let num = subset.to_matrix(num_cols)?;
        if is_classifier {
            let proba = pipe.predict_proba(&num, subset.tickers())?;
            let correct = proba
                .iter()
                .zip(&y)
                .filter(|(p, &t)| (**p >= 0.5) == (t > 0.5))
                .count();
            info!(
                "validation {}: accuracy {:.4} over {} rows",
                target,
                correct as f64 / y.len() as f64,
                y.len()
            );
        } else {
            let pred = pipe.predict(&num, subset.tickers())?;
            let mae =
                pred.iter().zip(&y).map(|(p, t)| (p - t).abs()).sum::<f64>() / y.len() as f64;
            info!("validation {}: MAE {:.6} over {} rows", target, mae, y.len());
        }
    }
    Ok(())
}
