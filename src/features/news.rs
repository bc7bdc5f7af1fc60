//! News feature construction.
//!
//! A news item published on day D may only inform features attributed to day
//! D+1 or later, so every item's aggregation date is shifted forward one
//! calendar day before any join against price feature keys. Per-key vectors
//! are mean-pooled, keeping a day's feature magnitude independent of how
//! many items were published.

use crate::data::types::NewsItem;
use crate::nlp::{TfIdf, Tokenizer};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Row key shared with the price feature table.
pub type NewsKey = (String, NaiveDate);

/// A numeric news block aligned one-to-one with a requested key set.
#[derive(Debug, Clone)]
pub struct NewsFeatureBlock {
    /// Column names, one per vocabulary term.
    pub names: Vec<String>,
    /// One row per requested key, in request order.
    pub rows: Vec<Vec<f64>>,
}

impl NewsFeatureBlock {
    fn zeros(n_keys: usize, n_terms: usize) -> Self {
        Self {
            names: (0..n_terms).map(|i| format!("news_tfidf_{}", i)).collect(),
            rows: vec![vec![0.0; n_terms]; n_keys],
        }
    }
}

/// Builds lag-aligned, mean-pooled text features for price feature keys.
pub struct NewsFeatureBuilder {
    max_per_day: usize,
    max_features: usize,
    tokenizer: Tokenizer,
}

impl NewsFeatureBuilder {
    pub fn new(max_per_day: usize, max_features: usize) -> Self {
        Self {
            max_per_day,
            max_features,
            tokenizer: Tokenizer::new().with_bigrams(),
        }
    }

    /// Fit a vectorizer on the news intersecting `keys` and build the
    /// aligned block. Every requested key gets exactly one row; keys with
    /// no news get an all-zero vector. An empty intersection yields a
    /// zero-width block and an empty vectorizer.
    pub fn fit_build(
        &self,
        news: &[NewsItem],
        keys: &[NewsKey],
    ) -> (NewsFeatureBlock, TfIdf) {
        let items = self.aligned_items(news, keys);
        if items.is_empty() {
            return (NewsFeatureBlock::zeros(keys.len(), 0), TfIdf::new());
        }

        let docs: Vec<Vec<String>> = items
            .iter()
            .map(|(_, text)| self.tokenizer.tokenize(text))
            .collect();
        let mut vectorizer = TfIdf::new().with_max_features(self.max_features);
        vectorizer.fit(&docs);

        let block = self.pool(&items, keys, &vectorizer);
        (block, vectorizer)
    }

    /// Build the aligned block reusing an already-fitted vectorizer.
    pub fn build_with(
        &self,
        news: &[NewsItem],
        keys: &[NewsKey],
        vectorizer: &TfIdf,
    ) -> NewsFeatureBlock {
        let items = self.aligned_items(news, keys);
        if items.is_empty() {
            return NewsFeatureBlock::zeros(keys.len(), vectorizer.n_terms());
        }
        self.pool(&items, keys, vectorizer)
    }

    /// Shift each item to its aggregation date, cap items per (ticker, day)
    /// keeping the first N seen, and keep only items whose key is requested.
    fn aligned_items(&self, news: &[NewsItem], keys: &[NewsKey]) -> Vec<(NewsKey, String)> {
        let requested: HashSet<&NewsKey> = keys.iter().collect();
        let mut group_counts: HashMap<NewsKey, usize> = HashMap::new();
        let mut items = Vec::new();

        for item in news {
            let agg_date = item.news_date + chrono::Duration::days(1);
            let key = (item.ticker.clone(), agg_date);

            let count = group_counts.entry(key.clone()).or_insert(0);
            if *count >= self.max_per_day {
                continue;
            }
            *count += 1;

            if requested.contains(&key) {
                items.push((key, item.text()));
            }
        }
        items
    }

    /// Vectorize each surviving item, average within each key group, and
    /// left-join the result onto the complete requested key set.
    fn pool(
        &self,
        items: &[(NewsKey, String)],
        keys: &[NewsKey],
        vectorizer: &TfIdf,
    ) -> NewsFeatureBlock {
        let n_terms = vectorizer.n_terms();
        let mut sums: HashMap<&NewsKey, (Vec<f64>, usize)> = HashMap::new();

        for (key, text) in items {
            let vector = vectorizer.transform(&self.tokenizer.tokenize(text));
            let entry = sums
                .entry(key)
                .or_insert_with(|| (vec![0.0; n_terms], 0));
            for (acc, v) in entry.0.iter_mut().zip(&vector) {
                *acc += v;
            }
            entry.1 += 1;
        }

        let rows = keys
            .iter()
            .map(|key| match sums.get(key) {
                Some((sum, count)) => sum.iter().map(|s| s / *count as f64).collect(),
                None => vec![0.0; n_terms],
            })
            .collect();

        NewsFeatureBlock {
            names: (0..n_terms).map(|i| format!("news_tfidf_{}", i)).collect(),
            rows,
        }
    }
}
