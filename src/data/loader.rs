//! CSV loading for candles and news.
//!
//! Loads are all-or-nothing: a missing required column, an unparseable date,
//! or a malformed number fails the whole load with no partial result.

use super::types::{Candle, NewsItem};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs::File;
use std::path::Path;

/// CSV loader with configurable date/ticker column names for candle files.
pub struct DataLoader {
    date_col: String,
    ticker_col: String,
}

impl DataLoader {
    /// Create a loader reading the given candle column names.
    pub fn new(date_col: &str, ticker_col: &str) -> Self {
        Self {
            date_col: date_col.to_string(),
            ticker_col: ticker_col.to_string(),
        }
    }

    /// Load candles and sort them by (ticker, date) ascending, stable.
    pub fn load_candles<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Candle>> {
        let file = File::open(&path)
            .with_context(|| format!("failed to open candle file {:?}", path.as_ref()))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers()?.clone();

        let ticker_idx = column_index(&headers, &self.ticker_col)?;
        let date_idx = column_index(&headers, &self.date_col)?;
        let open_idx = column_index(&headers, "open")?;
        let high_idx = column_index(&headers, "high")?;
        let low_idx = column_index(&headers, "low")?;
        let close_idx = column_index(&headers, "close")?;
        let volume_idx = column_index(&headers, "volume")?;

        let mut candles = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("bad candle record at row {}", line + 1))?;
            candles.push(Candle {
                ticker: field(&record, ticker_idx, line)?.to_string(),
                date: parse_date(field(&record, date_idx, line)?)?,
                open: parse_number(field(&record, open_idx, line)?, "open", line)?,
                high: parse_number(field(&record, high_idx, line)?, "high", line)?,
                low: parse_number(field(&record, low_idx, line)?, "low", line)?,
                close: parse_number(field(&record, close_idx, line)?, "close", line)?,
                volume: parse_number(field(&record, volume_idx, line)?, "volume", line)?,
            });
        }

        candles.sort_by(|a, b| (a.ticker.as_str(), a.date).cmp(&(b.ticker.as_str(), b.date)));
        Ok(candles)
    }

    /// Load news items, deriving a single ticker per item (first entry of the
    /// comma-joined list) and a date-only field for join alignment.
    pub fn load_news<P: AsRef<Path>>(&self, path: P) -> Result<Vec<NewsItem>> {
        let file = File::open(&path)
            .with_context(|| format!("failed to open news file {:?}", path.as_ref()))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers()?.clone();

        let tickers_idx = column_index(&headers, "tickers")?;
        let publish_idx = column_index(&headers, "publish_date")?;
        let title_idx = column_index(&headers, "title")?;
        let publication_idx = column_index(&headers, "publication")?;

        let mut items = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("bad news record at row {}", line + 1))?;
            let raw_tickers = field(&record, tickers_idx, line)?;
            let ticker = raw_tickers.split(',').next().unwrap_or("").trim().to_string();
            items.push(NewsItem {
                ticker,
                news_date: parse_date(field(&record, publish_idx, line)?)?,
                title: field(&record, title_idx, line)?.to_string(),
                publication: field(&record, publication_idx, line)?.to_string(),
            });
        }
        Ok(items)
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("missing required column '{}'", name))
}

fn field<'a>(record: &'a StringRecord, idx: usize, line: usize) -> Result<&'a str> {
    record
        .get(idx)
        .with_context(|| format!("row {} is missing field {}", line + 1, idx))
}

/// Parse a date from either a datetime ("2024-01-02 00:00:00") or a bare
/// date ("2024-01-02"), keeping the date component.
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unparseable date '{}'", raw))
}

fn parse_number(raw: &str, name: &str, line: usize) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("unparseable {} '{}' at row {}", name, raw, line + 1))
}
