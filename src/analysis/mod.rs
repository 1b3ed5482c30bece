//! Corpus analysis
//!
//! This module handles:
//! - Optimizing and flattening a corpus into prompt lines
//! - Estimating tokens and splitting content into budgeted segments
//! - Driving single or multi-segment completion calls and merging results
//! - Persisting the final analysis

mod chunker;
mod coordinator;
mod flatten;
mod prompts;
mod tokens;

pub use chunker::{effective_budget, Chunker, Segment, TRUNCATION_MARKER};
pub use coordinator::{fallback_merge, run_analysis, Analyzer};
pub use flatten::{flatten_corpus, is_heading_line, optimize_corpus, FlatCorpus};
pub use tokens::{
    model_context_limit, HeuristicEstimator, TiktokenEstimator, TokenEstimator,
    DEFAULT_CONTEXT_LIMIT,
};

use crate::llm::CompletionError;
use crate::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Failures raised before or around completion calls
///
/// A completion failure inside the pipeline is not an `AnalysisError`: it
/// is recovered per segment or reported through [`AnalysisOutcome::Failed`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Corpus contains no pages")]
    EmptyCorpus,

    #[error(
        "No token budget left for content: limit {context_limit}, reserved {reserved}, URL lookup {url_lookup_tokens}"
    )]
    BudgetExhausted {
        context_limit: usize,
        reserved: usize,
        url_lookup_tokens: usize,
    },

    #[error("Failed to write analysis: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of analyzing one segment
#[derive(Debug, Clone, PartialEq)]
pub struct PartialAnalysis {
    /// 1-based segment number
    pub index: usize,
    /// Model output, or a failure placeholder
    pub text: String,
    pub urls: BTreeMap<String, String>,
}

/// Final analysis document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedAnalysis {
    pub summary: String,

    #[serde(with = "crate::content::unix_seconds")]
    pub timestamp: DateTime<Utc>,

    pub model_used: String,

    /// Present for multi-segment runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts_count: Option<usize>,

    /// Per-segment texts, for multi-segment runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<String>>,

    /// Set when the merge call failed and the fallback concatenation was used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unification_error: Option<String>,
}

/// What an analysis run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Completed(UnifiedAnalysis),
    /// The single-segment completion call failed
    Failed { error: String },
}

impl AnalysisOutcome {
    pub fn summary(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Completed(analysis) => Some(&analysis.summary),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisOutcome::Completed(_))
    }
}

impl From<CompletionError> for AnalysisOutcome {
    fn from(error: CompletionError) -> Self {
        AnalysisOutcome::Failed {
            error: error.to_string(),
        }
    }
}
