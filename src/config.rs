//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Immutable parameter set shared by training and prediction.
///
/// A snapshot of the training-time config is persisted alongside the fitted
/// artifacts, and prediction rebuilds features from that snapshot so the
/// engineered column set always matches what the models were trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seed threaded into any randomized solver state.
    pub seed: u64,
    /// Parallelism hint for per-ticker feature computation.
    pub n_jobs: usize,
    /// Cap on news items per (ticker, day) group before aggregation.
    pub max_news_per_day: usize,
    /// Maximum text vocabulary size.
    pub max_features: usize,
    /// Number of lagged daily returns.
    pub price_lags: usize,
    /// Rolling window sizes, in observations.
    pub roll_windows: Vec<usize>,
    /// Name of the date column in the candle CSV.
    pub date_col: String,
    /// Name of the ticker column in the candle CSV.
    pub ticker_col: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 1337,
            n_jobs: 4,
            max_news_per_day: 1000,
            max_features: 20_000,
            price_lags: 5,
            roll_windows: vec![5, 10, 20],
            date_col: "begin".to_string(),
            ticker_col: "ticker".to_string(),
        }
    }
}
