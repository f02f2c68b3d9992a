pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{GeneratedRecord, GenerationBatch, RowFailure, RunSummary, SourceRow};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, TextGenerator};
pub use crate::utils::error::Result;
