pub mod causal_lm;
pub mod generator;
pub mod hub;
pub mod kind;
pub mod prompt;

pub use causal_lm::{CausalLm, ModelOptions, WeightDtype};
pub use generator::{CandleGenerator, GenerationParams};
pub use kind::{Architecture, ModelKind};
