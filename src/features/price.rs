//! Per-ticker price feature construction.
//!
//! Each ticker's chronological candle run is processed independently:
//! daily log-returns, forward-looking targets, lagged returns, and trailing
//! rolling statistics. Rolling state never crosses a ticker boundary, so the
//! result for a ticker depends only on that ticker's own history.

use crate::data::types::Candle;
use crate::features::table::{FeatureTable, TableError};
use rayon::prelude::*;

/// Horizon, in days, of the cumulative forward return target.
pub const LONG_HORIZON: usize = 20;

/// Builds lag/rolling features and forward targets from sorted candles.
#[derive(Debug, Clone)]
pub struct PriceFeatureBuilder {
    lags: usize,
    windows: Vec<usize>,
    n_jobs: usize,
}

impl PriceFeatureBuilder {
    pub fn new(lags: usize, windows: &[usize]) -> Self {
        Self {
            lags,
            windows: windows.to_vec(),
            n_jobs: 1,
        }
    }

    /// Set the parallelism hint. Results are identical for any value.
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Build the feature table for candles sorted by (ticker, date).
    ///
    /// Tickers are partitioned, mapped independently, and concatenated in
    /// input order; no state is shared across partitions.
    pub fn build(&self, candles: &[Candle]) -> Result<FeatureTable, TableError> {
        let groups = partition_by_ticker(candles);

        let blocks: Vec<FeatureTable> = if self.n_jobs > 1 {
            groups
                .par_iter()
                .map(|g| self.build_ticker(g))
                .collect::<Result<_, _>>()?
        } else {
            groups
                .iter()
                .map(|g| self.build_ticker(g))
                .collect::<Result<_, _>>()?
        };

        let mut table = FeatureTable::default();
        for block in blocks {
            table.append(block)?;
        }
        Ok(table)
    }

    fn build_ticker(&self, candles: &[Candle]) -> Result<FeatureTable, TableError> {
        let n = candles.len();
        let tickers = candles.iter().map(|c| c.ticker.clone()).collect();
        let dates = candles.iter().map(|c| c.date).collect();
        let mut table = FeatureTable::new(tickers, dates);

        table.add_dense_column("open", candles.iter().map(|c| c.open).collect())?;
        table.add_dense_column("high", candles.iter().map(|c| c.high).collect())?;
        table.add_dense_column("low", candles.iter().map(|c| c.low).collect())?;
        table.add_dense_column("close", candles.iter().map(|c| c.close).collect())?;
        table.add_dense_column("volume", candles.iter().map(|c| c.volume).collect())?;

        // daily log-return; the first row of a ticker has no predecessor
        let mut r1: Vec<Option<f64>> = vec![None; n];
        for i in 1..n {
            r1[i] = Some(candles[i].close.ln() - candles[i - 1].close.ln());
        }

        // high-low range; a zero range carries no signal
        let range: Vec<Option<f64>> = candles
            .iter()
            .map(|c| {
                let r = c.range();
                (r != 0.0).then_some(r)
            })
            .collect();

        // forward targets: next-day return and the cumulative return over
        // the next LONG_HORIZON days; undefined at each ticker's tail
        let mut target_r1: Vec<Option<f64>> = vec![None; n];
        for i in 0..n.saturating_sub(1) {
            target_r1[i] = r1[i + 1];
        }
        let mut target_r20: Vec<Option<f64>> = vec![None; n];
        for i in 0..n {
            if i + LONG_HORIZON < n {
                target_r20[i] = sum_of(&r1[i + 1..=i + LONG_HORIZON]);
            }
        }

        // directional labels; undefined targets propagate, never coerced to 0
        let label_up_1: Vec<Option<f64>> = target_r1
            .iter()
            .map(|t| t.map(|v| if v > 0.0 { 1.0 } else { 0.0 }))
            .collect();
        let label_up_20: Vec<Option<f64>> = target_r20
            .iter()
            .map(|t| t.map(|v| if v > 0.0 { 1.0 } else { 0.0 }))
            .collect();

        table.add_column("r1", r1.clone())?;
        table.add_column("range", range.clone())?;
        table.add_column("target_r1", target_r1)?;
        table.add_column("target_R20", target_r20)?;
        table.add_column("label_up_1", label_up_1)?;
        table.add_column("label_up_20", label_up_20)?;

        for k in 1..=self.lags {
            let lagged: Vec<Option<f64>> = (0..n)
                .map(|i| if i >= k { r1[i - k] } else { None })
                .collect();
            table.add_column(&format!("r1_lag{}", k), lagged)?;
        }

        for &w in &self.windows {
            let mut roll_mean: Vec<Option<f64>> = vec![None; n];
            let mut roll_std: Vec<Option<f64>> = vec![None; n];
            let mut range_mean: Vec<Option<f64>> = vec![None; n];
            for i in 0..n {
                if i + 1 >= w {
                    let r1_window = &r1[i + 1 - w..=i];
                    roll_mean[i] = mean_of(r1_window);
                    roll_std[i] = std_of(r1_window);
                    range_mean[i] = mean_of(&range[i + 1 - w..=i]);
                }
            }
            table.add_column(&format!("r1_roll_mean_{}", w), roll_mean)?;
            table.add_column(&format!("r1_roll_std_{}", w), roll_std)?;
            table.add_column(&format!("range_roll_mean_{}", w), range_mean)?;
        }

        Ok(table)
    }
}

/// Split sorted candles into contiguous per-ticker runs.
fn partition_by_ticker(candles: &[Candle]) -> Vec<&[Candle]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=candles.len() {
        if i == candles.len() || candles[i].ticker != candles[start].ticker {
            groups.push(&candles[start..i]);
            start = i;
        }
    }
    groups
}

/// Sum of a window; undefined if any element is undefined.
fn sum_of(window: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    for v in window {
        sum += (*v)?;
    }
    Some(sum)
}

/// Mean of a window; undefined if any element is undefined.
fn mean_of(window: &[Option<f64>]) -> Option<f64> {
    Some(sum_of(window)? / window.len() as f64)
}

/// Sample standard deviation (ddof = 1) of a window; undefined if any
/// element is undefined or the window has fewer than two observations.
fn std_of(window: &[Option<f64>]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    let mean = mean_of(window)?;
    let mut ss = 0.0;
    for v in window {
        ss += ((*v)? - mean).powi(2);
    }
    Some((ss / (window.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_candles(ticker: &str, closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                ticker: ticker.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_first_row_return_undefined() {
        let candles = make_candles("A", &[100.0, 101.0, 102.0]);
        let table = PriceFeatureBuilder::new(2, &[2]).build(&candles).unwrap();

        let r1 = table.column("r1").unwrap();
        assert!(r1[0].is_none());
        let expected = (101.0f64).ln() - (100.0f64).ln();
        assert!((r1[1].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_lag_defined_from_row_k_plus_one() {
        let candles = make_candles("A", &[100.0, 101.0, 102.0, 103.0, 104.0]);
        let table = PriceFeatureBuilder::new(2, &[2]).build(&candles).unwrap();

        let lag1 = table.column("r1_lag1").unwrap();
        let lag2 = table.column("r1_lag2").unwrap();

        // lag k copies r1 shifted by k; r1 itself starts at row 1
        assert!(lag1[0].is_none());
        assert!(lag1[1].is_none());
        assert!(lag1[2].is_some());
        assert!(lag2[2].is_none());
        assert!(lag2[3].is_some());

        let r1 = table.column("r1").unwrap();
        assert_eq!(lag1[2], r1[1]);
        assert_eq!(lag2[3], r1[1]);
    }

    #[test]
    fn test_target_r1_is_next_day_return() {
        let candles = make_candles("A", &[100.0, 101.0, 103.0, 102.0]);
        let table = PriceFeatureBuilder::new(1, &[2]).build(&candles).unwrap();

        let r1 = table.column("r1").unwrap();
        let target = table.column("target_r1").unwrap();

        for i in 0..3 {
            assert_eq!(target[i], r1[i + 1]);
        }
        // no synthetic value for the last row
        assert!(target[3].is_none());
    }

    #[test]
    fn test_target_r20_undefined_in_tail() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let candles = make_candles("A", &closes);
        let table = PriceFeatureBuilder::new(1, &[5]).build(&candles).unwrap();

        let r1 = table.column("r1").unwrap();
        let target = table.column("target_R20").unwrap();

        let expected: f64 = (1..=20).map(|j| r1[j].unwrap()).sum();
        assert!((target[0].unwrap() - expected).abs() < 1e-12);
        for i in 10..30 {
            assert!(target[i].is_none());
        }
    }

    #[test]
    fn test_labels_propagate_undefined() {
        let candles = make_candles("A", &[100.0, 101.0, 100.5]);
        let table = PriceFeatureBuilder::new(1, &[2]).build(&candles).unwrap();

        let label = table.column("label_up_1").unwrap();
        assert_eq!(label[0], Some(1.0));
        assert_eq!(label[1], Some(0.0));
        assert!(label[2].is_none());
    }

    #[test]
    fn test_zero_range_is_undefined() {
        let mut candles = make_candles("A", &[100.0, 101.0]);
        candles[1].high = 101.0;
        candles[1].low = 101.0;
        let table = PriceFeatureBuilder::new(1, &[2]).build(&candles).unwrap();

        let range = table.column("range").unwrap();
        assert_eq!(range[0], Some(2.0));
        assert!(range[1].is_none());
    }

    #[test]
    fn test_rolling_never_crosses_tickers() {
        let mut candles = make_candles("A", &[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        candles.extend(make_candles("B", &[50.0, 51.0, 52.0, 53.0, 54.0, 55.0]));
        let table = PriceFeatureBuilder::new(1, &[3]).build(&candles).unwrap();

        let roll = table.column("r1_roll_mean_3").unwrap();
        // B starts at row 6; its r1[0] is None, so the first defined rolling
        // mean needs rows 7..9 of the combined table
        assert!(roll[6].is_none());
        assert!(roll[7].is_none());
        assert!(roll[8].is_none());
        assert!(roll[9].is_some());
    }

    #[test]
    fn test_ticker_values_independent_of_other_tickers() {
        let a = make_candles("A", &[100.0, 103.0, 99.0, 104.0, 101.0, 105.0, 107.0]);
        let b = make_candles("B", &[50.0, 52.0, 51.0, 55.0, 53.0, 56.0, 54.0]);

        let builder = PriceFeatureBuilder::new(2, &[3]);
        let alone = builder.build(&b).unwrap();

        let mut combined_input = a.clone();
        combined_input.extend(b.clone());
        let combined = builder.build(&combined_input).unwrap();

        for name in alone.names() {
            let solo = alone.column(name).unwrap();
            let merged = &combined.column(name).unwrap()[a.len()..];
            assert_eq!(solo, merged, "column {} differs", name);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut candles = make_candles("A", &[100.0, 101.0, 99.0, 104.0, 102.0]);
        candles.extend(make_candles("B", &[50.0, 52.0, 51.0, 55.0, 53.0]));
        candles.extend(make_candles("C", &[10.0, 11.0, 10.5, 11.5, 12.0]));

        let sequential = PriceFeatureBuilder::new(2, &[3]).build(&candles).unwrap();
        let parallel = PriceFeatureBuilder::new(2, &[3])
            .with_n_jobs(4)
            .build(&candles)
            .unwrap();

        assert_eq!(sequential.tickers(), parallel.tickers());
        for name in sequential.names() {
            assert_eq!(
                sequential.column(name).unwrap(),
                parallel.column(name).unwrap()
            );
        }
    }

    #[test]
    fn test_rolling_std_matches_sample_formula() {
        let candles = make_candles("A", &[100.0, 102.0, 101.0, 104.0]);
        let table = PriceFeatureBuilder::new(1, &[2]).build(&candles).unwrap();

        let r1 = table.column("r1").unwrap();
        let std2 = table.column("r1_roll_std_2").unwrap();

        let (a, b) = (r1[1].unwrap(), r1[2].unwrap());
        let mean = (a + b) / 2.0;
        let expected = ((a - mean).powi(2) + (b - mean).powi(2)).sqrt();
        assert!((std2[2].unwrap() - expected).abs() < 1e-12);
    }
}
