//! Feature engineering: price-derived and news-derived blocks.

pub mod news;
pub mod price;
pub mod table;

pub use news::{NewsFeatureBlock, NewsFeatureBuilder};
pub use price::PriceFeatureBuilder;
pub use table::{FeatureTable, TableError};
