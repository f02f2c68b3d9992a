use thiserror::Error;

#[derive(Error, Debug)]
pub enum McqError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Model runtime error: {0}")]
    ModelError(#[from] candle_core::Error),

    #[error("Model hub error: {0}")]
    HubError(#[from] hf_hub::api::sync::ApiError),

    #[error("Tokenizer error: {message}")]
    TokenizerError { message: String },

    #[error("Unsupported model name: {name}")]
    UnsupportedModel { name: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Input is missing required column '{column}'")]
    MissingColumnError { column: String },

    #[error("Generation error: {message}")]
    GenerationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Output,
    Model,
    Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl McqError {
    pub fn tokenizer(err: impl std::fmt::Display) -> Self {
        Self::TokenizerError {
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            McqError::UnsupportedModel { .. }
            | McqError::ConfigError { .. }
            | McqError::ConfigValidationError { .. }
            | McqError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            McqError::CsvError(_) | McqError::MissingColumnError { .. } => ErrorCategory::Input,
            McqError::IoError(_) | McqError::SerializationError(_) => ErrorCategory::Output,
            McqError::HubError(_) | McqError::TokenizerError { .. } => ErrorCategory::Model,
            McqError::ModelError(_) | McqError::GenerationError { .. } => {
                ErrorCategory::Generation
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路問題，重試可能成功
            McqError::HubError(_) => ErrorSeverity::Medium,
            McqError::ModelError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            McqError::UnsupportedModel { .. } => {
                "Use one of: PMCQ-Gemma2-9b, PMCQ-Llama3.1-8b, PMCQ-Mistral-7B"
            }
            McqError::ConfigError { .. }
            | McqError::ConfigValidationError { .. }
            | McqError::InvalidConfigValueError { .. } => {
                "Check the command line flags and the TOML configuration file"
            }
            McqError::CsvError(_) => "Make sure the input file is a valid UTF-8 CSV with a header row",
            McqError::MissingColumnError { .. } => "Add a 'text' column to the input CSV header",
            McqError::IoError(_) => "Check that the file exists and the path is readable/writable",
            McqError::SerializationError(_) => "Check the model's config.json and safetensors index",
            McqError::HubError(_) => {
                "Check network access to the Hugging Face hub and set HF_TOKEN for gated models"
            }
            McqError::TokenizerError { .. } => "Make sure the model repository ships a tokenizer.json",
            McqError::ModelError(_) => {
                "Try --cpu or a smaller --dtype; the device may be out of memory"
            }
            McqError::GenerationError { .. } => "Inspect the failing row and retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Could not read the input rows: {}", self),
            ErrorCategory::Output => format!("File operation failed: {}", self),
            ErrorCategory::Model => format!("Could not load the model: {}", self),
            ErrorCategory::Generation => format!("Text generation failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, McqError>;
