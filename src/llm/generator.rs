use crate::domain::ports::TextGenerator;
use crate::llm::causal_lm::{CausalLm, ModelOptions};
use crate::llm::hub::{fetch_model_files, ModelFiles};
use crate::llm::kind::ModelKind;
use crate::utils::error::{McqError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use candle_core::Tensor;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use serde::Deserialize;
use tokenizers::Tokenizer;

pub const DEFAULT_MAX_NEW_TOKENS: usize = 1024;
pub const DEFAULT_TOP_K: usize = 50;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_REPETITION_PENALTY: f32 = 1.1;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_SEED: u64 = 299792458;

/// Decoding hyperparameters for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_new_tokens: usize,
    pub top_k: usize,
    pub top_p: f64,
    pub repetition_penalty: f32,
    /// 0 表示對整段序列套用懲罰
    pub repeat_last_n: usize,
    pub seed: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            repetition_penalty: DEFAULT_REPETITION_PENALTY,
            repeat_last_n: 0,
            seed: DEFAULT_SEED,
        }
    }
}

impl GenerationParams {
    pub fn sampling(&self) -> Sampling {
        if self.temperature <= 0.0 {
            Sampling::ArgMax
        } else {
            Sampling::TopKThenTopP {
                k: self.top_k,
                p: self.top_p,
                temperature: self.temperature,
            }
        }
    }

    /// Start of the window the repetition penalty looks at.
    fn penalty_window_start(&self, seen: usize) -> usize {
        if self.repeat_last_n == 0 {
            0
        } else {
            seen.saturating_sub(self.repeat_last_n)
        }
    }
}

impl Validate for GenerationParams {
    fn validate(&self) -> Result<()> {
        validate_range("temperature", self.temperature, 0.0, 100.0)?;
        validate_positive_number("max_new_tokens", self.max_new_tokens, 1)?;
        validate_positive_number("top_k", self.top_k, 1)?;
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(McqError::InvalidConfigValueError {
                field: "top_p".to_string(),
                value: self.top_p.to_string(),
                reason: "Value must be in (0, 1]".to_string(),
            });
        }
        validate_range("repetition_penalty", self.repetition_penalty, 0.01, 10.0)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EosTokenId {
    Single(u32),
    Multiple(Vec<u32>),
}

#[derive(Debug, Deserialize)]
struct EosConfig {
    #[serde(default)]
    eos_token_id: Option<EosTokenId>,
}

/// Reads `eos_token_id` (a single id or a list) from a model `config.json`.
pub fn parse_eos_token_ids(config_json: &[u8]) -> Result<Vec<u32>> {
    let config: EosConfig = serde_json::from_slice(config_json)?;
    Ok(match config.eos_token_id {
        Some(EosTokenId::Single(id)) => vec![id],
        Some(EosTokenId::Multiple(ids)) => ids,
        None => Vec::new(),
    })
}

fn resolve_eos_tokens(kind: ModelKind, files: &ModelFiles, tokenizer: &Tokenizer) -> Result<Vec<u32>> {
    let mut eos = parse_eos_token_ids(&std::fs::read(&files.config)?)?;
    if eos.is_empty() {
        eos = kind
            .default_eos_tokens()
            .iter()
            .filter_map(|token| tokenizer.token_to_id(token))
            .collect();
    }
    if eos.is_empty() {
        tracing::warn!("No EOS token found for {}, generation stops only at max_new_tokens", kind);
    }
    Ok(eos)
}

/// Sampling loop over a candle model. Owns the model and tokenizer for the
/// whole run; each call decodes one sequence.
pub struct CandleGenerator {
    model: CausalLm,
    tokenizer: Tokenizer,
    eos_tokens: Vec<u32>,
    params: GenerationParams,
    logits_processor: LogitsProcessor,
}

impl CandleGenerator {
    pub fn load(kind: ModelKind, options: &ModelOptions, params: GenerationParams) -> Result<Self> {
        let files = fetch_model_files(kind.repo_path(), &options.revision)?;
        let device = options.device()?;
        let dtype = options.dtype_for(&device);
        tracing::info!("Loading {} on {:?} as {:?}", kind, device, dtype);

        let tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(McqError::tokenizer)?;
        let eos_tokens = resolve_eos_tokens(kind, &files, &tokenizer)?;
        let model = CausalLm::load(kind.architecture(), &files, dtype, &device)?;

        Ok(Self::new(model, tokenizer, eos_tokens, params))
    }

    pub fn new(
        model: CausalLm,
        tokenizer: Tokenizer,
        eos_tokens: Vec<u32>,
        params: GenerationParams,
    ) -> Self {
        let logits_processor = LogitsProcessor::from_sampling(params.seed, params.sampling());
        Self {
            model,
            tokenizer,
            eos_tokens,
            params,
            logits_processor,
        }
    }
}

impl TextGenerator for CandleGenerator {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        self.model.reset()?;

        // 模板已帶 BOS，不再加入特殊符號
        let mut tokens = self
            .tokenizer
            .encode(prompt, false)
            .map_err(McqError::tokenizer)?
            .get_ids()
            .to_vec();
        if tokens.is_empty() {
            return Err(McqError::GenerationError {
                message: "prompt encoded to zero tokens".to_string(),
            });
        }
        let prompt_len = tokens.len();

        let start = std::time::Instant::now();
        let mut seqlen_offset = 0;
        for index in 0..self.params.max_new_tokens {
            let context_size = if index > 0 { 1 } else { tokens.len() };
            let ctxt = &tokens[tokens.len().saturating_sub(context_size)..];
            let input = Tensor::new(ctxt, self.model.device())?.unsqueeze(0)?;
            let logits = self.model.forward(&input, seqlen_offset)?;
            seqlen_offset += ctxt.len();

            let logits = if self.params.repetition_penalty == 1.0 {
                logits
            } else {
                let start_at = self.params.penalty_window_start(tokens.len());
                candle_transformers::utils::apply_repeat_penalty(
                    &logits,
                    self.params.repetition_penalty,
                    &tokens[start_at..],
                )?
            };

            let next_token = self.logits_processor.sample(&logits)?;
            tokens.push(next_token);
            if self.eos_tokens.contains(&next_token) {
                break;
            }
        }

        let generated = tokens.len() - prompt_len;
        tracing::debug!(
            "Generated {} tokens in {:.2?} ({:.1} token/s)",
            generated,
            start.elapsed(),
            generated as f64 / start.elapsed().as_secs_f64().max(f64::EPSILON)
        );

        self.tokenizer
            .decode(&tokens, false)
            .map_err(McqError::tokenizer)
    }
}
