//! Token-budgeted segmentation
//!
//! # Algorithm
//!
//! Lines are grouped into sections, each opened by a heading-like line (page
//! marker or `\n## ` heading). A finished section is appended whole to the
//! open segment; when that would push the segment past the budget and the
//! segment already holds something, the segment is closed first. Lines that
//! precede the first section are placed one by one under the same rule.
//!
//! Two lossy paths exist, both logged:
//! - a single line larger than the whole budget is truncated until it fits
//! - a section larger than the whole budget is placed line by line, so it
//!   spans several segments
//!
//! Every other section lands in exactly one segment, and segments are
//! allowed to run well under budget to keep it that way.

use crate::analysis::flatten::{heading_text, is_heading_line, parse_page_marker, FlatCorpus};
use crate::analysis::tokens::TokenEstimator;
use crate::analysis::AnalysisError;
use std::collections::BTreeMap;

/// Appended to truncated lines
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Share of the proportional cut kept on each truncation attempt
const TRUNCATION_SLACK: f64 = 0.9;

/// A budget-bounded slice of the flattened corpus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    pub lines: Vec<String>,
    /// Titles and headings in this segment mapped to their page URL
    pub title_to_url: BTreeMap<String, String>,
    /// Sum of the per-line estimates
    pub estimated_tokens: usize,
}

impl Segment {
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn push(&mut self, line: String, tokens: usize) {
        self.lines.push(line);
        self.estimated_tokens += tokens;
    }
}

#[derive(Debug, Default)]
struct Section {
    lines: Vec<(String, usize)>,
    tokens: usize,
    urls: BTreeMap<String, String>,
}

/// Token budget left for content in each segment
///
/// `reserved_tokens` is capped at a quarter of `context_limit` so small
/// models keep room for content.
pub fn effective_budget(
    context_limit: usize,
    reserved_tokens: usize,
    url_lookup_tokens: usize,
) -> Result<usize, AnalysisError> {
    let reserved = reserved_tokens.min(context_limit / 4);
    let budget = context_limit
        .saturating_sub(reserved)
        .saturating_sub(url_lookup_tokens);

    if budget == 0 {
        return Err(AnalysisError::BudgetExhausted {
            context_limit,
            reserved,
            url_lookup_tokens,
        });
    }
    Ok(budget)
}

/// Splits flattened content into segments under a token budget
pub struct Chunker<'a> {
    estimator: &'a dyn TokenEstimator,
    budget: usize,
}

impl<'a> Chunker<'a> {
    pub fn new(estimator: &'a dyn TokenEstimator, budget: usize) -> Self {
        Self { estimator, budget }
    }

    /// Segments `flat` in order
    pub fn split(&self, flat: &FlatCorpus) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = Segment::default();
        let mut section: Option<Section> = None;

        for raw in &flat.lines {
            if is_heading_line(raw) {
                if let Some(done) = section.take() {
                    self.place_section(done, &mut current, &mut segments);
                }

                let mut opened = Section {
                    urls: section_urls(raw, &flat.title_to_url),
                    ..Section::default()
                };
                let (line, tokens) = self.fit_line(raw);
                opened.lines.push((line, tokens));
                opened.tokens = tokens;
                section = Some(opened);
            } else {
                let (line, tokens) = self.fit_line(raw);
                match section.as_mut() {
                    Some(open) => {
                        open.lines.push((line, tokens));
                        open.tokens += tokens;
                    }
                    None => self.place_line(line, tokens, &mut current, &mut segments),
                }
            }
        }

        if let Some(done) = section.take() {
            self.place_section(done, &mut current, &mut segments);
        }
        if !current.is_empty() {
            segments.push(current);
        }

        tracing::info!(
            "Content split into {} segments (budget {} tokens each)",
            segments.len(),
            self.budget
        );
        for (i, segment) in segments.iter().enumerate() {
            tracing::debug!("Segment {}: ~{} tokens", i + 1, segment.estimated_tokens);
        }

        segments
    }

    fn place_section(&self, section: Section, current: &mut Segment, segments: &mut Vec<Segment>) {
        if section.tokens > self.budget {
            tracing::warn!(
                "Section of ~{} tokens exceeds the {} token budget; splitting it across segments",
                section.tokens,
                self.budget
            );
            for (line, tokens) in section.lines {
                self.place_line(line, tokens, current, segments);
                current.title_to_url.extend(section.urls.clone());
            }
            return;
        }

        if current.estimated_tokens + section.tokens > self.budget && !current.is_empty() {
            segments.push(std::mem::take(current));
        }
        for (line, tokens) in section.lines {
            current.push(line, tokens);
        }
        current.title_to_url.extend(section.urls);
    }

    fn place_line(
        &self,
        line: String,
        tokens: usize,
        current: &mut Segment,
        segments: &mut Vec<Segment>,
    ) {
        if current.estimated_tokens + tokens > self.budget && !current.is_empty() {
            segments.push(std::mem::take(current));
        }
        current.push(line, tokens);
    }

    /// Returns the line and its estimate, truncating it when it alone exceeds the budget
    fn fit_line(&self, line: &str) -> (String, usize) {
        let tokens = self.estimator.estimate(line);
        if tokens <= self.budget {
            return (line.to_string(), tokens);
        }

        tracing::warn!(
            "Line of ~{} tokens exceeds the {} token budget; truncating",
            tokens,
            self.budget
        );

        // A budget smaller than the marker itself gets a bare cut
        self.shrink(line, tokens, TRUNCATION_MARKER)
            .or_else(|| self.shrink(line, tokens, ""))
            .unwrap_or_default()
    }

    /// Cuts `line` until its kept prefix plus `suffix` fits the budget
    ///
    /// Returns `None` when even an empty prefix plus `suffix` is too large.
    fn shrink(&self, line: &str, tokens: usize, suffix: &str) -> Option<(String, usize)> {
        let mut keep = line.chars().count();
        let mut estimate = tokens;
        loop {
            let ratio = self.budget as f64 / estimate.max(1) as f64;
            let proportional = (keep as f64 * ratio * TRUNCATION_SLACK) as usize;
            keep = proportional.min(keep.saturating_sub(1));

            let truncated: String = line.chars().take(keep).chain(suffix.chars()).collect();
            estimate = self.estimator.estimate(&truncated);

            if estimate <= self.budget {
                return Some((truncated, estimate));
            }
            if keep == 0 {
                return None;
            }
        }
    }
}

/// URL entries contributed by a section's opening line
fn section_urls(line: &str, title_to_url: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut urls = BTreeMap::new();
    if let Some((title, url)) = parse_page_marker(line) {
        urls.insert(title.to_string(), url.to_string());
    } else if let Some(heading) = heading_text(line) {
        if let Some(url) = title_to_url.get(heading) {
            urls.insert(heading.to_string(), url.clone());
        }
    }
    urls
}
