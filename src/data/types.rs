//! Core data types for candles and news.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV candle for a single ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub ticker: String,
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Candle {
    /// The candle's total range (high - low).
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check if the candle is bullish (close > open).
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// A news item attributed to a single ticker.
///
/// The raw feed carries a comma-joined ticker list; loading keeps only the
/// first entry. `news_date` is the date component of the publish timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub ticker: String,
    pub news_date: NaiveDate,
    pub title: String,
    pub publication: String,
}

impl NewsItem {
    /// Title and publication source joined into the text that gets vectorized.
    pub fn text(&self) -> String {
        format!("{} \n{}", self.title, self.publication)
    }
}
