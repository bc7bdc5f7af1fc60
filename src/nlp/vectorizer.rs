//! TF-IDF text vectorization with a bounded vocabulary.
//!
//! Documents are tokenized term lists. The fitted vocabulary keeps the most
//! frequent terms up to the configured bound and assigns indices in
//! alphabetical term order, so the feature layout depends only on the corpus
//! content. A fitted vectorizer round-trips through serde so it can be
//! persisted with the rest of the trained artifacts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// TF-IDF vectorizer with smoothed inverse document frequency and
/// L2-normalized output rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdf {
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f64>,
    max_features: usize,
    normalize: bool,
}

impl TfIdf {
    pub fn new() -> Self {
        Self {
            vocabulary: HashMap::new(),
            terms: Vec::new(),
            idf: Vec::new(),
            max_features: usize::MAX,
            normalize: true,
        }
    }

    /// Bound the vocabulary to the most frequent terms.
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Toggle L2 normalization of output vectors.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Number of terms in the fitted vocabulary.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Fitted vocabulary terms, in index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Fit the vocabulary and IDF weights on a tokenized corpus.
    pub fn fit(&mut self, documents: &[Vec<String>]) {
        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();

        for doc in documents {
            for term in doc {
                *corpus_freq.entry(term.as_str()).or_insert(0) += 1;
            }
            let unique: std::collections::HashSet<&str> =
                doc.iter().map(|t| t.as_str()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // keep the most frequent terms; ties resolve alphabetically
        let mut by_freq: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
        by_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        by_freq.truncate(self.max_features);

        // indices in alphabetical term order for a deterministic layout
        let mut selected: Vec<&str> = by_freq.into_iter().map(|(t, _)| t).collect();
        selected.sort_unstable();

        let n_docs = documents.len() as f64;
        self.terms = selected.iter().map(|t| t.to_string()).collect();
        self.vocabulary = self
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        self.idf = selected
            .iter()
            .map(|t| {
                let df = *doc_freq.get(t).unwrap_or(&0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
    }

    /// Transform a tokenized document into its TF-IDF vector. Terms outside
    /// the vocabulary contribute nothing; an empty vocabulary yields an
    /// empty vector.
    pub fn transform(&self, document: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0; self.terms.len()];
        for term in document {
            if let Some(&idx) = self.vocabulary.get(term) {
                vector[idx] += 1.0;
            }
        }
        for (idx, tf) in vector.iter_mut().enumerate() {
            *tf *= self.idf[idx];
        }
        if self.normalize {
            l2_normalize(&mut vector);
        }
        vector
    }

    /// Fit on the corpus, then transform every document.
    pub fn fit_transform(&mut self, documents: &[Vec<String>]) -> Vec<Vec<f64>> {
        self.fit(documents);
        documents.iter().map(|d| self.transform(d)).collect()
    }
}

impl Default for TfIdf {
    fn default() -> Self {
        Self::new()
    }
}

fn l2_normalize(vector: &mut [f64]) {
    let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|d| d.split_whitespace().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_vocabulary_sorted_alphabetically() {
        let mut tfidf = TfIdf::new();
        tfidf.fit(&docs(&["zebra apple", "apple mango"]));

        assert_eq!(tfidf.terms(), &["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut tfidf = TfIdf::new().with_max_features(2);
        tfidf.fit(&docs(&["up up up down", "up down flat"]));

        // "up" (4) and "down" (2) survive; "flat" (1) is dropped
        assert_eq!(tfidf.n_terms(), 2);
        assert!(tfidf.terms().contains(&"up".to_string()));
        assert!(tfidf.terms().contains(&"down".to_string()));
    }

    #[test]
    fn test_transform_unknown_terms_ignored() {
        let mut tfidf = TfIdf::new();
        tfidf.fit(&docs(&["alpha beta"]));

        let v = tfidf.transform(&["gamma".to_string(), "delta".to_string()]);
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_rows_are_l2_normalized() {
        let mut tfidf = TfIdf::new();
        let rows = tfidf.fit_transform(&docs(&["gain loss", "gain gain rally"]));

        for row in rows {
            let norm: f64 = row.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rarer_terms_weighted_higher() {
        let mut tfidf = TfIdf::new().with_normalize(false);
        tfidf.fit(&docs(&["common rare", "common", "common other"]));

        let v = tfidf.transform(&["common".to_string(), "rare".to_string()]);
        let common_idx = tfidf.terms().iter().position(|t| t == "common").unwrap();
        let rare_idx = tfidf.terms().iter().position(|t| t == "rare").unwrap();
        assert!(v[rare_idx] > v[common_idx]);
    }

    #[test]
    fn test_empty_vectorizer_transforms_to_empty() {
        let tfidf = TfIdf::new();
        assert!(tfidf.transform(&["anything".to_string()]).is_empty());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut tfidf = TfIdf::new().with_max_features(10);
        tfidf.fit(&docs(&["merger talks", "merger closed"]));

        let json = serde_json::to_string(&tfidf).unwrap();
        let restored: TfIdf = serde_json::from_str(&json).unwrap();

        let doc = vec!["merger".to_string()];
        assert_eq!(tfidf.transform(&doc), restored.transform(&doc));
    }
}
