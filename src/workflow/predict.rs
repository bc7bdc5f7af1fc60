//! Prediction workflow.
//!
//! Rebuilds the feature pipeline from the config snapshot recorded with the
//! artifacts, reconciles the live column set against the recorded one, and
//! emits one forecast row per eligible (ticker, date).

use crate::data::DataLoader;
use crate::features::{NewsFeatureBuilder, PriceFeatureBuilder};
use crate::pipeline::Artifacts;
use crate::workflow::{base_columns, drop_undefined_rows, keys_up_to, merge_news_block};
use anyhow::{ensure, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// One row of the forecast output table.
#[derive(Debug, Serialize)]
struct ForecastRow {
    date: NaiveDate,
    ticker: String,
    r1_pred: f64,
    #[serde(rename = "R20_pred")]
    r20_pred: f64,
    p_up_1: f64,
    p_up_20: f64,
}

/// Produce forecasts for every row with sufficient history, sorted by
/// (date, ticker), and write them to `outfile` as CSV.
pub fn predict(
    candles_csv: &Path,
    news_csv: Option<&Path>,
    artifacts_dir: &Path,
    outfile: &Path,
) -> Result<()> {
    let (artifacts, meta) = Artifacts::load(artifacts_dir)?;
    let cfg = &meta.config;

    let loader = DataLoader::new(&cfg.date_col, &cfg.ticker_col);
    let candles = loader.load_candles(candles_csv)?;
    ensure!(!candles.is_empty(), "candle file contains no rows");

    let builder =
        PriceFeatureBuilder::new(cfg.price_lags, &cfg.roll_windows).with_n_jobs(cfg.n_jobs);
    let mut features = builder.build(&candles)?;
    drop_undefined_rows(&mut features, &base_columns(cfg))?;
    ensure!(
        features.n_rows() > 0,
        "no rows with enough history to predict"
    );
    info!("{} rows eligible for prediction", features.n_rows());

    match (news_csv, artifacts.vectorizer.as_ref()) {
        (Some(news_path), Some(vectorizer)) => {
            let news = loader.load_news(news_path)?;
            info!("loaded {} news items", news.len());
            let (key_rows, keys) = keys_up_to(&features, None);
            let block = NewsFeatureBuilder::new(cfg.max_news_per_day, cfg.max_features)
                .build_with(&news, &keys, vectorizer);
            merge_news_block(&mut features, &key_rows, &block)?;
        }
        (Some(_), None) => {
            warn!("news supplied but the artifacts carry no fitted vectorizer; ignoring news");
        }
        _ => {}
    }

    // recover recorded columns absent from the fresh features
    for name in &meta.num_cols {
        if !features.has_column(name) {
            features.add_column(name, vec![Some(0.0); features.n_rows()])?;
        }
    }

    let num = features.to_matrix(&meta.num_cols)?;
    let cats = features.tickers();

    let r1_pred = artifacts.pipe_r1.predict(&num, cats)?;
    let r20_pred = artifacts.pipe_r20.predict(&num, cats)?;
    let p_up_1 = artifacts.pipe_up1.predict_proba(&num, cats)?;
    let p_up_20 = artifacts.pipe_up20.predict_proba(&num, cats)?;

    let mut rows: Vec<ForecastRow> = (0..features.n_rows())
        .map(|i| ForecastRow {
            date: features.dates()[i],
            ticker: features.tickers()[i].clone(),
            r1_pred: r1_pred[i],
            r20_pred: r20_pred[i],
            p_up_1: p_up_1[i],
            p_up_20: p_up_20[i],
        })
        .collect();
    rows.sort_by(|a, b| (a.date, a.ticker.as_str()).cmp(&(b.date, b.ticker.as_str())));

    let mut writer = csv::Writer::from_path(outfile)
        .with_context(|| format!("failed to create output file {:?}", outfile))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("wrote {} forecasts to {:?}", rows.len(), outfile);
    Ok(())
}
