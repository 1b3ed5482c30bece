//! Analysis coordinator
//!
//! Picks between two paths:
//! - single: the whole flattened corpus plus prompt fits the context limit,
//!   so one completion call produces the summary
//! - multi: the corpus is segmented, each segment is analyzed in order, and
//!   a final call merges the partial analyses
//!
//! In the multi path a failed segment call becomes a placeholder text and a
//! failed merge call falls back to concatenating the parts, so a run always
//! ends with an analysis document.

use crate::analysis::chunker::{effective_budget, Chunker};
use crate::analysis::flatten::{flatten_corpus, optimize_corpus, FlatCorpus};
use crate::analysis::prompts;
use crate::analysis::tokens::{model_context_limit, TiktokenEstimator, TokenEstimator};
use crate::analysis::{AnalysisError, AnalysisOutcome, PartialAnalysis, UnifiedAnalysis};
use crate::config::{AnalysisConfig, Config, OutputConfig};
use crate::llm::{CompletionProvider, CompletionRequest, OpenAiProvider};
use crate::output::{write_analysis, AnalysisFiles};
use crate::storage::Corpus;
use chrono::Utc;
use std::collections::BTreeMap;

/// Drives completion calls over a corpus
pub struct Analyzer {
    provider: Box<dyn CompletionProvider>,
    estimator: Box<dyn TokenEstimator>,
    model: String,
    temperature: f32,
    context_limit: usize,
    reserved_tokens: usize,
    optimize_input: bool,
}

impl Analyzer {
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        estimator: Box<dyn TokenEstimator>,
        config: &AnalysisConfig,
    ) -> Self {
        let context_limit = config
            .max_context_tokens
            .unwrap_or_else(|| model_context_limit(&config.model));

        Self {
            provider,
            estimator,
            model: config.model.clone(),
            temperature: config.temperature,
            context_limit,
            reserved_tokens: config.reserved_tokens,
            optimize_input: config.optimize_input,
        }
    }

    /// Analyzes `corpus`
    ///
    /// Returns `Err` only for problems detected before the first completion
    /// call. A failed call on the single path yields
    /// [`AnalysisOutcome::Failed`].
    pub async fn analyze(&self, corpus: &Corpus) -> Result<AnalysisOutcome, AnalysisError> {
        if corpus.is_empty() {
            return Err(AnalysisError::EmptyCorpus);
        }

        let flat = if self.optimize_input {
            tracing::debug!("Optimizing corpus before flattening");
            flatten_corpus(&optimize_corpus(corpus))
        } else {
            flatten_corpus(corpus)
        };

        let urls_json = prompts::url_lookup_json(&flat.title_to_url);
        let template_tokens = self.estimator.estimate(&prompts::base_prompt("", &urls_json));
        let content_tokens = self.estimator.estimate(&flat.joined());

        tracing::info!(
            "Corpus of {} pages: ~{} content tokens, ~{} prompt tokens, limit {} ({} via {})",
            corpus.len(),
            content_tokens,
            template_tokens,
            self.context_limit,
            self.model,
            self.provider.name()
        );

        if template_tokens + content_tokens <= self.context_limit {
            Ok(self.analyze_single(&flat, &urls_json).await)
        } else {
            let url_tokens = self.estimator.estimate(&urls_json);
            let budget = effective_budget(self.context_limit, self.reserved_tokens, url_tokens)?;
            Ok(self.analyze_segments(&flat, budget).await)
        }
    }

    /// Analyzes `corpus` and writes the result under `output`
    pub async fn analyze_and_save(
        &self,
        corpus: &Corpus,
        output: &OutputConfig,
    ) -> Result<(AnalysisOutcome, AnalysisFiles), AnalysisError> {
        let outcome = self.analyze(corpus).await?;
        let files = write_analysis(output, &outcome)?;
        Ok((outcome, files))
    }

    async fn analyze_single(&self, flat: &FlatCorpus, urls_json: &str) -> AnalysisOutcome {
        tracing::info!("Content fits in one request");

        let request = self.request(
            prompts::system_instruction(),
            prompts::base_prompt(&flat.joined(), urls_json),
        );

        match self.provider.complete(&request).await {
            Ok(summary) => AnalysisOutcome::Completed(UnifiedAnalysis {
                summary,
                timestamp: Utc::now(),
                model_used: self.model.clone(),
                parts_count: None,
                parts: None,
                unification_error: None,
            }),
            Err(e) => {
                tracing::error!("Analysis request failed: {}", e);
                e.into()
            }
        }
    }

    async fn analyze_segments(&self, flat: &FlatCorpus, budget: usize) -> AnalysisOutcome {
        let segments = Chunker::new(self.estimator.as_ref(), budget).split(flat);
        let total = segments.len();
        let mut partials: Vec<PartialAnalysis> = Vec::with_capacity(total);

        for (i, segment) in segments.iter().enumerate() {
            let index = i + 1;
            tracing::info!(
                "Analyzing part {}/{} (~{} tokens)",
                index,
                total,
                segment.estimated_tokens
            );

            let urls_json = prompts::url_lookup_json(&segment.title_to_url);
            let prompt = if index == 1 {
                prompts::base_prompt(&segment.content(), &urls_json)
            } else {
                prompts::continuation_prompt(&segment.content(), &urls_json, partials.len())
            };
            let request = self.request(prompts::segment_system_instruction(index, total), prompt);

            let text = match self.provider.complete(&request).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Analysis of part {} failed: {}", index, e);
                    format!("[Analysis failed for part {}: {}]", index, e)
                }
            };

            partials.push(PartialAnalysis {
                index,
                text,
                urls: segment.title_to_url.clone(),
            });
        }

        self.unify(partials).await
    }

    async fn unify(&self, partials: Vec<PartialAnalysis>) -> AnalysisOutcome {
        tracing::info!("Merging {} partial analyses", partials.len());

        let mut all_urls = BTreeMap::new();
        for partial in &partials {
            all_urls.extend(partial.urls.clone());
        }

        let request = self.request(
            prompts::unification_system_instruction(),
            prompts::unification_prompt(&partials, &all_urls),
        );

        let (summary, unification_error) = match self.provider.complete(&request).await {
            Ok(summary) => (summary, None),
            Err(e) => {
                tracing::error!("Merge request failed, concatenating parts instead: {}", e);
                (fallback_merge(&partials), Some(e.to_string()))
            }
        };

        AnalysisOutcome::Completed(UnifiedAnalysis {
            summary,
            timestamp: Utc::now(),
            model_used: self.model.clone(),
            parts_count: Some(partials.len()),
            parts: Some(partials.into_iter().map(|p| p.text).collect()),
            unification_error,
        })
    }

    fn request(&self, system: String, prompt: String) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            system,
            prompt,
            temperature: self.temperature,
        }
    }
}

/// Labeled concatenation of partial analyses, used when merging fails
pub fn fallback_merge(partials: &[PartialAnalysis]) -> String {
    partials
        .iter()
        .map(|p| format!("# Part {}\n\n{}", p.index, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Analyzes `corpus` with the configured OpenAI-compatible backend
///
/// A missing API key is reported before anything is written.
pub async fn run_analysis(
    config: &Config,
    corpus: &Corpus,
) -> Result<(AnalysisOutcome, AnalysisFiles), AnalysisError> {
    let provider = OpenAiProvider::from_config(&config.analysis)?;
    let estimator = TiktokenEstimator::for_model(&config.analysis.model);
    if !estimator.is_exact_family() {
        tracing::debug!("Token counts for {} are approximate", config.analysis.model);
    }

    Analyzer::new(Box::new(provider), Box::new(estimator), &config.analysis)
        .analyze_and_save(corpus, &config.output)
        .await
}
