//! # forecast_ml
//!
//! Short-horizon return and directional forecasts for equities from daily
//! candles and optional news text, scored against realized outcomes.
//!
//! The pipeline runs as a fixed batch cycle:
//!
//! - `train`: engineer leakage-safe per-ticker features, fit four forecast
//!   heads (two return regressors, two direction classifiers), persist
//!   artifacts
//! - `predict`: rebuild features for new data and emit aligned forecasts
//! - `evaluate`: join forecasts to realized returns and report accuracy

pub mod config;
pub mod data;
pub mod features;
pub mod models;
pub mod nlp;
pub mod pipeline;
pub mod workflow;

pub use config::Config;
pub use data::{Candle, DataLoader, NewsItem};
pub use features::{FeatureTable, NewsFeatureBuilder, PriceFeatureBuilder};
pub use models::{LogisticRegression, RidgeRegression};
pub use nlp::{TfIdf, Tokenizer};
pub use pipeline::{Artifacts, Metadata, ModelPipeline};
pub use workflow::EvaluationReport;
