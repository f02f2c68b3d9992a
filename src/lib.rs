pub mod config;
pub mod core;
pub mod domain;
pub mod llm;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{engine::McqEngine, pipeline::McqPipeline};
pub use llm::{CandleGenerator, GenerationParams, ModelKind};
pub use utils::error::{McqError, Result};
