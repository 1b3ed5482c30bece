//! Token estimation and model context limits
//!
//! Estimates are approximate planning figures. The BPE count is inflated by
//! 10% and the fallback heuristic is deliberately pessimistic; nothing here
//! claims to match the server-side count exactly.

use tiktoken_rs::CoreBPE;

/// Multiplier applied to BPE counts
const SAFETY_FACTOR: f64 = 1.1;

/// Characters per token assumed by the fallback heuristic
const CHARS_PER_TOKEN: usize = 3;

/// Context limit used for models not listed in [`MODEL_LIMITS`]
pub const DEFAULT_CONTEXT_LIMIT: usize = 2000;

/// Usable context per model family, matched by prefix in this order
const MODEL_LIMITS: &[(&str, usize)] = &[
    ("gpt-4o-mini", 125_000),
    ("gpt-4o", 125_000),
    ("gpt-4", 6_500),
    ("gpt-3.5-turbo-16k", 14_000),
    ("gpt-3.5-turbo", 3_000),
];

/// Returns the context limit for `model`
///
/// # Examples
///
/// ```
/// use site_digest::analysis::model_context_limit;
///
/// assert_eq!(model_context_limit("gpt-4o-2024-08-06"), 125_000);
/// assert_eq!(model_context_limit("gpt-4-turbo"), 6_500);
/// assert_eq!(model_context_limit("llama3"), 2_000);
/// ```
pub fn model_context_limit(model: &str) -> usize {
    MODEL_LIMITS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_CONTEXT_LIMIT)
}

/// Approximates how many tokens a text costs
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Character-count heuristic: one token per three characters
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count() / CHARS_PER_TOKEN
    }
}

/// BPE estimator for OpenAI model families
///
/// Falls back to [`HeuristicEstimator`] when no encoding can be loaded.
pub struct TiktokenEstimator {
    bpe: Option<CoreBPE>,
}

impl TiktokenEstimator {
    /// Loads the encoding for `model`, or `cl100k_base` when the model is unknown
    pub fn for_model(model: &str) -> Self {
        let bpe = tiktoken_rs::get_bpe_from_model(model).or_else(|_| tiktoken_rs::cl100k_base());

        match bpe {
            Ok(bpe) => Self { bpe: Some(bpe) },
            Err(e) => {
                tracing::warn!(
                    "No tokenizer available for {}: {}; using a character estimate",
                    model,
                    e
                );
                Self { bpe: None }
            }
        }
    }

    /// True when the BPE encoding loaded
    pub fn is_exact_family(&self) -> bool {
        self.bpe.is_some()
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => {
                let count = bpe.encode_with_special_tokens(text).len();
                (count as f64 * SAFETY_FACTOR) as usize
            }
            None => HeuristicEstimator.estimate(text),
        }
    }
}
