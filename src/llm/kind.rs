use crate::domain::model::SourceRow;
use crate::llm::prompt::PROMPT;
use crate::utils::error::{McqError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const GEMMA_MODEL_TURN: &str = "<start_of_turn>model\n";
const GEMMA_END_OF_TURN: &str = "<end_of_turn>";
const LLAMA_HEADER_END: &str = "<|end_header_id|>\n\n";
const LLAMA_END_OF_TEXT: &str = "<|end_of_text|>";
const MISTRAL_INST_END: &str = "[/INST]";
const MISTRAL_EOS: &str = "</s>";

/// Backbone family used to build the candle model for a [`ModelKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Gemma2,
    Llama,
    Mistral,
}

/// The fine-tuned PMCQ checkpoints this tool knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ModelKind {
    #[serde(rename = "PMCQ-Gemma2-9b")]
    #[cfg_attr(feature = "cli", value(name = "PMCQ-Gemma2-9b"))]
    Gemma2_9b,
    #[serde(rename = "PMCQ-Llama3.1-8b")]
    #[cfg_attr(feature = "cli", value(name = "PMCQ-Llama3.1-8b"))]
    Llama31_8b,
    #[serde(rename = "PMCQ-Mistral-7B")]
    #[cfg_attr(feature = "cli", value(name = "PMCQ-Mistral-7B"))]
    Mistral7b,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Gemma2_9b,
        ModelKind::Llama31_8b,
        ModelKind::Mistral7b,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Gemma2_9b => "PMCQ-Gemma2-9b",
            ModelKind::Llama31_8b => "PMCQ-Llama3.1-8b",
            ModelKind::Mistral7b => "PMCQ-Mistral-7B",
        }
    }

    /// Hugging Face hub repository holding the weights and tokenizer.
    pub fn repo_path(&self) -> &'static str {
        match self {
            ModelKind::Gemma2_9b => "Kamyar-zeinalipour/PMCQ-Gemma2-9b",
            ModelKind::Llama31_8b => "Kamyar-zeinalipour/PMCQ-Llama3.1-8b",
            ModelKind::Mistral7b => "Kamyar-zeinalipour/PMCQ-Mistral-7B",
        }
    }

    pub fn architecture(&self) -> Architecture {
        match self {
            ModelKind::Gemma2_9b => Architecture::Gemma2,
            ModelKind::Llama31_8b => Architecture::Llama,
            ModelKind::Mistral7b => Architecture::Mistral,
        }
    }

    /// 當 config.json 沒有 eos_token_id 時使用的結束符號
    pub fn default_eos_tokens(&self) -> &'static [&'static str] {
        match self {
            ModelKind::Gemma2_9b => &["<eos>"],
            ModelKind::Llama31_8b => &["<|end_of_text|>", "<|eot_id|>"],
            ModelKind::Mistral7b => &["</s>"],
        }
    }

    /// Wraps the instruction block and the row text in the model's chat syntax.
    pub fn format_row(&self, row: &SourceRow) -> String {
        let text = &row.text;
        match self {
            ModelKind::Gemma2_9b => {
                format!("<bos><start_of_turn>user\n{PROMPT}{text}\n<start_of_turn>model\n")
            }
            ModelKind::Llama31_8b => format!(
                "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\nYou are helpful assistant\n<|eot_id|><|start_header_id|>user<|end_header_id|>\n\n{PROMPT}{text} <|eot_id|><|start_header_id|>assistant<|end_header_id|>"
            ),
            ModelKind::Mistral7b => format!("<s>[INST] {PROMPT}{text} [/INST] "),
        }
    }

    /// Pulls the assistant reply out of a decoded sequence.
    ///
    /// Returns `None` when the delimiters for this model are missing; that is
    /// a normal outcome for truncated or malformed generations.
    pub fn extract_text(&self, decoded: &str) -> Option<String> {
        match self {
            ModelKind::Gemma2_9b => between(decoded, GEMMA_MODEL_TURN, GEMMA_END_OF_TURN),
            ModelKind::Llama31_8b => {
                if decoded.matches(LLAMA_HEADER_END).count() < 2 {
                    return None;
                }
                // 第三段：system/user 標頭之後的助手回覆
                let reply = decoded.split(LLAMA_HEADER_END).nth(2)?;
                reply.split(LLAMA_END_OF_TEXT).next().map(str::to_string)
            }
            ModelKind::Mistral7b => between(decoded, MISTRAL_INST_END, MISTRAL_EOS),
        }
    }
}

/// Segment after the first `start` (up to any later `start`), cut at the first `end`.
/// Both markers must appear somewhere in `text`.
fn between(text: &str, start: &str, end: &str) -> Option<String> {
    if !text.contains(start) || !text.contains(end) {
        return None;
    }
    let segment = text.split(start).nth(1)?;
    segment.split(end).next().map(str::to_string)
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = McqError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| McqError::UnsupportedModel {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_in_order(haystack: &str, needles: &[&str]) {
        let mut offset = 0;
        for needle in needles {
            let found = haystack[offset..]
                .find(needle)
                .unwrap_or_else(|| panic!("'{}' not found after offset {}", needle, offset));
            offset += found + needle.len();
        }
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
            assert!(kind.repo_path().ends_with(kind.name()));
            assert!(kind.repo_path().starts_with("Kamyar-zeinalipour/"));
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "PMCQ-Qwen-7B".parse::<ModelKind>().unwrap_err();
        assert!(matches!(err, McqError::UnsupportedModel { ref name } if name == "PMCQ-Qwen-7B"));
        // 名稱大小寫需完全相符
        assert!("pmcq-gemma2-9b".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_format_row_gemma() {
        let prompt = ModelKind::Gemma2_9b.format_row(&SourceRow::new("X"));
        assert_eq!(
            prompt,
            format!("<bos><start_of_turn>user\n{}X\n<start_of_turn>model\n", PROMPT)
        );
        assert_in_order(&prompt, &["<bos>", "<start_of_turn>user\n", PROMPT, "X", "<start_of_turn>model\n"]);
    }

    #[test]
    fn test_format_row_llama() {
        let prompt = ModelKind::Llama31_8b.format_row(&SourceRow::new("X"));
        assert_in_order(
            &prompt,
            &[
                "<|begin_of_text|>",
                "<|start_header_id|>system<|end_header_id|>\nYou are helpful assistant\n<|eot_id|>",
                "<|start_header_id|>user<|end_header_id|>\n\n",
                PROMPT,
                "X <|eot_id|>",
                "<|start_header_id|>assistant<|end_header_id|>",
            ],
        );
        assert!(prompt.ends_with("<|start_header_id|>assistant<|end_header_id|>"));
        // 提示本身只含一個 "\n\n" 標頭結尾
        assert_eq!(prompt.matches(LLAMA_HEADER_END).count(), 1);
    }

    #[test]
    fn test_format_row_mistral() {
        let prompt = ModelKind::Mistral7b.format_row(&SourceRow::new("X"));
        assert_eq!(prompt, format!("<s>[INST] {}X [/INST] ", PROMPT));
    }

    #[test]
    fn test_format_row_keeps_persian_text() {
        let row = SourceRow::new("سلام دنیا");
        for kind in ModelKind::ALL {
            assert!(kind.format_row(&row).contains("Text: سلام دنیا"));
        }
    }

    #[test]
    fn test_extract_gemma() {
        let decoded = format!(
            "{}سوال؟ الف. یک<end_of_turn>\n<eos>",
            ModelKind::Gemma2_9b.format_row(&SourceRow::new("X"))
        );
        assert_eq!(
            ModelKind::Gemma2_9b.extract_text(&decoded).as_deref(),
            Some("سوال؟ الف. یک")
        );
    }

    #[test]
    fn test_extract_gemma_missing_markers() {
        assert_eq!(ModelKind::Gemma2_9b.extract_text("<start_of_turn>model\nno end"), None);
        assert_eq!(ModelKind::Gemma2_9b.extract_text("reply<end_of_turn>"), None);
        assert_eq!(ModelKind::Gemma2_9b.extract_text(""), None);
    }

    #[test]
    fn test_extract_llama() {
        let decoded = format!(
            "{}\n\nسوال؟ الف. یک<|eot_id|><|end_of_text|>",
            ModelKind::Llama31_8b.format_row(&SourceRow::new("X"))
        );
        assert_eq!(
            ModelKind::Llama31_8b.extract_text(&decoded).as_deref(),
            Some("سوال؟ الف. یک<|eot_id|>")
        );
    }

    #[test]
    fn test_extract_llama_without_end_of_text_keeps_tail() {
        let decoded = "a<|end_header_id|>\n\nb<|end_header_id|>\n\nreply";
        assert_eq!(
            ModelKind::Llama31_8b.extract_text(decoded).as_deref(),
            Some("reply")
        );
    }

    #[test]
    fn test_extract_llama_needs_two_headers() {
        let prompt_only = ModelKind::Llama31_8b.format_row(&SourceRow::new("X"));
        assert_eq!(ModelKind::Llama31_8b.extract_text(&prompt_only), None);
        assert_eq!(ModelKind::Llama31_8b.extract_text("<|end_of_text|>"), None);
    }

    #[test]
    fn test_extract_mistral() {
        let decoded = format!(
            "{}سوال؟ الف. یک</s>",
            ModelKind::Mistral7b.format_row(&SourceRow::new("X"))
        );
        assert_eq!(
            ModelKind::Mistral7b.extract_text(&decoded).as_deref(),
            Some(" سوال؟ الف. یک")
        );
    }

    #[test]
    fn test_extract_mistral_missing_markers() {
        assert_eq!(ModelKind::Mistral7b.extract_text("<s>[INST] hi [/INST] reply"), None);
        assert_eq!(ModelKind::Mistral7b.extract_text("reply</s>"), None);
    }

    #[test]
    fn test_extract_stops_at_next_start_marker() {
        let decoded = "[/INST]first[/INST]second</s>";
        assert_eq!(ModelKind::Mistral7b.extract_text(decoded).as_deref(), Some("first"));
    }

    #[test]
    fn test_architecture_mapping() {
        assert_eq!(ModelKind::Gemma2_9b.architecture(), Architecture::Gemma2);
        assert_eq!(ModelKind::Llama31_8b.architecture(), Architecture::Llama);
        assert_eq!(ModelKind::Mistral7b.architecture(), Architecture::Mistral);
    }
}
