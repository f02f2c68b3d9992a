use crate::domain::model::{GenerationBatch, SourceRow};
use crate::llm::kind::ModelKind;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn model_kind(&self) -> ModelKind;
    fn input_file(&self) -> &str;
    fn output_file(&self) -> &str;
}

/// Turns a fully formatted prompt into the raw decoded model output,
/// prompt included and special tokens kept.
pub trait TextGenerator: Send {
    fn generate(&mut self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceRow>>;
    async fn transform(&self, rows: Vec<SourceRow>) -> Result<GenerationBatch>;
    async fn load(&self, batch: GenerationBatch) -> Result<String>;
}
