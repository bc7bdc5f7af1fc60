//! Preprocessing, model pipelines, and artifact persistence.

pub mod artifacts;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod preprocess;

pub use artifacts::{Artifacts, Metadata};
pub use pipeline::{ModelPipeline, PipelineError};
pub use preprocess::{OneHotEncoder, Preprocessor, StandardScaler};
