use crate::core::{
    ConfigProvider, GeneratedRecord, GenerationBatch, Pipeline, RowFailure, SourceRow, Storage,
    TextGenerator,
};
use crate::domain::model::{GENERATED_COLUMN, TEXT_COLUMN};
use crate::llm::kind::ModelKind;
use crate::utils::error::{McqError, Result};
use tokio::sync::Mutex;

/// Reads source rows, asks the model for one MCQ per row and writes the CSV.
pub struct McqPipeline<S: Storage, C: ConfigProvider, G: TextGenerator> {
    storage: S,
    config: C,
    generator: Mutex<G>,
}

impl<S: Storage, C: ConfigProvider, G: TextGenerator> McqPipeline<S, C, G> {
    pub fn new(storage: S, config: C, generator: G) -> Self {
        Self {
            storage,
            config,
            generator: Mutex::new(generator),
        }
    }

    pub fn into_generator(self) -> G {
        self.generator.into_inner()
    }
}

/// format → generate → extract for a single row.
fn process_row<G: TextGenerator>(
    kind: ModelKind,
    generator: &mut G,
    row: &SourceRow,
) -> Result<Option<String>> {
    let prompt = kind.format_row(row);
    let response = generator.generate(&prompt)?;
    Ok(kind.extract_text(&response))
}

pub fn parse_rows(data: &[u8]) -> Result<Vec<SourceRow>> {
    let mut reader = csv::Reader::from_reader(data);

    let headers = reader.headers()?;
    if !headers.iter().any(|h| h == TEXT_COLUMN) {
        return Err(McqError::MissingColumnError {
            column: TEXT_COLUMN.to_string(),
        });
    }

    reader
        .deserialize::<SourceRow>()
        .map(|row| row.map_err(McqError::from))
        .collect()
}

pub fn render_records(records: &[GeneratedRecord]) -> Result<Vec<u8>> {
    // 手動寫表頭，確保沒有資料時仍輸出欄位名稱
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([TEXT_COLUMN, GENERATED_COLUMN])?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| McqError::IoError(e.into_error()))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, G: TextGenerator> Pipeline for McqPipeline<S, C, G> {
    async fn extract(&self) -> Result<Vec<SourceRow>> {
        tracing::debug!("Reading input rows from: {}", self.config.input_file());
        let data = self.storage.read_file(self.config.input_file()).await?;
        parse_rows(&data)
    }

    async fn transform(&self, rows: Vec<SourceRow>) -> Result<GenerationBatch> {
        let kind = self.config.model_kind();
        let mut generator = self.generator.lock().await;
        let mut batch = GenerationBatch {
            input_rows: rows.len(),
            ..GenerationBatch::default()
        };

        for (index, row) in rows.into_iter().enumerate() {
            match process_row(kind, &mut *generator, &row) {
                Ok(generated) => {
                    tracing::info!("Index: {}", index);
                    tracing::info!("Input text: {}", row.text);
                    match &generated {
                        Some(mcq) => tracing::info!("Generated Persian MCQ: {}", mcq),
                        None => {
                            tracing::warn!("⚠️ No {} reply markers found in output for row {}", kind, index);
                            batch.unparsed += 1;
                        }
                    }
                    batch.records.push(GeneratedRecord {
                        text: row.text,
                        generated_mcq: generated,
                    });
                }
                Err(e) => {
                    tracing::error!("❌ Error processing row: {}. Error: {}", row.text, e);
                    batch.failures.push(RowFailure {
                        index,
                        text: row.text,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }

    async fn load(&self, batch: GenerationBatch) -> Result<String> {
        let output_path = self.config.output_file().to_string();
        let data = render_records(&batch.records)?;

        tracing::debug!(
            "Writing {} records ({} bytes) to {}",
            batch.records.len(),
            data.len(),
            output_path
        );
        self.storage.write_file(&output_path, &data).await?;

        Ok(output_path)
    }
}
