use serde::{Deserialize, Serialize};

pub const TEXT_COLUMN: &str = "text";
pub const GENERATED_COLUMN: &str = "Generated Persian MCQ";

/// 輸入 CSV 的一列，只讀取 `text` 欄位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub text: String,
}

impl SourceRow {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedRecord {
    pub text: String,
    #[serde(rename = "Generated Persian MCQ")]
    pub generated_mcq: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub index: usize,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationBatch {
    pub input_rows: usize,
    pub records: Vec<GeneratedRecord>,
    pub failures: Vec<RowFailure>,
    /// 已寫出但抽取結果為空的列數
    pub unparsed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: String,
    pub input_rows: usize,
    pub written_rows: usize,
    pub failed_rows: usize,
    pub unparsed_rows: usize,
}
