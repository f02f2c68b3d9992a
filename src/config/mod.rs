pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use super::toml_config::TomlConfig;
    use crate::core::ConfigProvider;
    use crate::llm::causal_lm::{ModelOptions, WeightDtype};
    use crate::llm::generator::{GenerationParams, DEFAULT_TEMPERATURE};
    use crate::llm::kind::ModelKind;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_file_extension, validate_path, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "persian-mcq")]
    #[command(about = "Generate Persian multiple-choice questions from CSV rows with a PMCQ language model")]
    pub struct CliConfig {
        #[arg(long, value_enum, help = "Pretrained model name")]
        pub model_name: ModelKind,

        #[arg(long, help = "Path to the input CSV file (needs a 'text' column)")]
        pub input_file: String,

        #[arg(long, default_value = "output.csv", help = "Path to save the output CSV file")]
        pub output_file: String,

        #[arg(long, default_value_t = DEFAULT_TEMPERATURE, help = "Temperature for text generation")]
        pub temperature: f64,

        #[arg(long, help = "Optional TOML file with [generation] and [model] settings")]
        pub config: Option<String>,

        #[arg(long, help = "Sampling seed")]
        pub seed: Option<u64>,

        #[arg(long, help = "Maximum number of new tokens per row")]
        pub max_new_tokens: Option<usize>,

        #[arg(long, help = "Run on CPU even when a GPU is available")]
        pub cpu: bool,

        #[arg(long, value_enum, help = "Weight dtype (default: bf16 on GPU, f32 on CPU)")]
        pub dtype: Option<WeightDtype>,

        #[arg(long, help = "Model revision on the hub (default: main)")]
        pub revision: Option<String>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[arg(long, help = "Log CPU and memory usage per phase")]
        pub monitor: bool,
    }

    impl CliConfig {
        pub fn load_toml(&self) -> Result<Option<TomlConfig>> {
            self.config.as_ref().map(TomlConfig::from_file).transpose()
        }

        /// 命令列 > TOML > 預設值
        pub fn generation_params(&self, file: Option<&TomlConfig>) -> GenerationParams {
            let section = file.map(TomlConfig::generation).unwrap_or_default();
            let defaults = GenerationParams::default();

            GenerationParams {
                temperature: self.temperature,
                max_new_tokens: self
                    .max_new_tokens
                    .or(section.max_new_tokens)
                    .unwrap_or(defaults.max_new_tokens),
                top_k: section.top_k.unwrap_or(defaults.top_k),
                top_p: section.top_p.unwrap_or(defaults.top_p),
                repetition_penalty: section
                    .repetition_penalty
                    .unwrap_or(defaults.repetition_penalty),
                repeat_last_n: section.repeat_last_n.unwrap_or(defaults.repeat_last_n),
                seed: self.seed.or(section.seed).unwrap_or(defaults.seed),
            }
        }

        pub fn model_options(&self, file: Option<&TomlConfig>) -> ModelOptions {
            let section = file.map(TomlConfig::model).unwrap_or_default();
            let defaults = ModelOptions::default();

            ModelOptions {
                revision: self
                    .revision
                    .clone()
                    .or(section.revision)
                    .unwrap_or(defaults.revision),
                cpu: self.cpu || section.cpu.unwrap_or(defaults.cpu),
                dtype: self.dtype.or(section.dtype),
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("input_file", &self.input_file)?;
            validate_file_extension("input_file", &self.input_file, &["csv"])?;
            validate_path("output_file", &self.output_file)?;
            validate_file_extension("output_file", &self.output_file, &["csv"])?;
            if let Some(config) = &self.config {
                validate_path("config", config)?;
            }
            self.generation_params(None).validate()
        }
    }

    impl ConfigProvider for CliConfig {
        fn model_kind(&self) -> ModelKind {
            self.model_name
        }

        fn input_file(&self) -> &str {
            &self.input_file
        }

        fn output_file(&self) -> &str {
            &self.output_file
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(args: &[&str]) -> std::result::Result<CliConfig, clap::Error> {
            CliConfig::try_parse_from(std::iter::once("persian-mcq").chain(args.iter().copied()))
        }

        #[test]
        fn test_defaults() {
            let config = parse(&["--model-name", "PMCQ-Mistral-7B", "--input-file", "rows.csv"]).unwrap();
            assert_eq!(config.model_name, ModelKind::Mistral7b);
            assert_eq!(config.output_file, "output.csv");
            assert_eq!(config.temperature, 0.1);
            assert!(!config.cpu);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_model_name_literals() {
            for kind in ModelKind::ALL {
                let config = parse(&["--model-name", kind.name(), "--input-file", "rows.csv"]).unwrap();
                assert_eq!(config.model_kind(), kind);
            }
        }

        #[test]
        fn test_unsupported_model_name_fails_parsing() {
            let err = parse(&["--model-name", "gpt2", "--input-file", "rows.csv"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        }

        #[test]
        fn test_required_flags() {
            assert!(parse(&["--input-file", "rows.csv"]).is_err());
            assert!(parse(&["--model-name", "PMCQ-Gemma2-9b"]).is_err());
        }

        #[test]
        fn test_validation_rejects_bad_values() {
            let config = parse(&[
                "--model-name",
                "PMCQ-Gemma2-9b",
                "--input-file",
                "rows.csv",
                "--temperature=-1",
            ])
            .unwrap();
            assert!(config.validate().is_err());

            let config = parse(&["--model-name", "PMCQ-Gemma2-9b", "--input-file", "rows.txt"]).unwrap();
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_cli_overrides_toml() {
            let file = TomlConfig::from_toml_str(
                "[generation]\nseed = 1\nmax_new_tokens = 256\ntop_k = 20\n[model]\nrevision = \"v1\"\ndtype = \"f16\"\n",
            )
            .unwrap();
            let config = parse(&[
                "--model-name",
                "PMCQ-Llama3.1-8b",
                "--input-file",
                "rows.csv",
                "--seed",
                "9",
                "--dtype",
                "f32",
            ])
            .unwrap();

            let params = config.generation_params(Some(&file));
            assert_eq!(params.seed, 9);
            assert_eq!(params.max_new_tokens, 256);
            assert_eq!(params.top_k, 20);
            assert_eq!(params.top_p, 0.95);

            let options = config.model_options(Some(&file));
            assert_eq!(options.revision, "v1");
            assert_eq!(options.dtype, Some(WeightDtype::F32));
            assert!(!options.cpu);
        }

        #[test]
        fn test_no_toml_uses_defaults() {
            let config = parse(&["--model-name", "PMCQ-Gemma2-9b", "--input-file", "rows.csv"]).unwrap();
            assert!(config.load_toml().unwrap().is_none());
            assert_eq!(config.generation_params(None), GenerationParams::default());
            assert_eq!(config.model_options(None), ModelOptions::default());
        }
    }
}
