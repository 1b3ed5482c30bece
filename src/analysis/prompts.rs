//! Prompt templates

use crate::analysis::PartialAnalysis;
use std::collections::BTreeMap;

const ANALYST_ROLE: &str = "You are an expert web content analyst. You extract, organize and \
explain information from websites in a detailed, well-structured way.";

const UNIFIER_ROLE: &str = "You merge several partial analyses of the same website into one \
unified, coherent and complete analysis without losing detail.";

/// Requested structure, shared by the base and continuation prompts
const ANALYSIS_BRIEF: &str = "\
Produce a thorough analysis containing:

1. A complete summary of the site's main information.
2. A detailed hierarchical tree of the site:
   - main categories and their sub-categories, each with a name, a description and a link
   - every product or article with its name, description, technical characteristics, \
price when available, and link
   - an indented list layout so the hierarchy is easy to read
3. A thematic classification of the content.
4. The relations between categories and how their products fit together.

Whenever you mention a specific element, link to the page it comes from using the URL \
dictionary below, in the form [Title or description](URL). Be exhaustive; length is not a concern.";

/// System instruction for the single-segment path
pub fn system_instruction() -> String {
    ANALYST_ROLE.to_string()
}

/// System instruction for segment `index` (1-based) of `total`
pub fn segment_system_instruction(index: usize, total: usize) -> String {
    if index <= 1 {
        format!("{} This is part 1/{} of the content.", ANALYST_ROLE, total)
    } else {
        format!(
            "{} This is part {}/{} of the content; continue the analysis consistently with the previous parts.",
            ANALYST_ROLE, index, total
        )
    }
}

pub fn unification_system_instruction() -> String {
    UNIFIER_ROLE.to_string()
}

/// Serializes a title -> URL lookup for embedding in a prompt
pub fn url_lookup_json(urls: &BTreeMap<String, String>) -> String {
    serde_json::to_string(urls).unwrap_or_else(|_| "{}".to_string())
}

/// Prompt for the first (or only) segment
pub fn base_prompt(content: &str, urls_json: &str) -> String {
    format!(
        "I am giving you the content extracted from a website and a dictionary mapping titles to their URLs.\n\n\
{brief}\n\n\
URL dictionary (title -> url):\n{urls}\n\n\
SITE CONTENT:\n{content}\n",
        brief = ANALYSIS_BRIEF,
        urls = urls_json,
        content = content
    )
}

/// Prompt for a later segment
///
/// Only the number of already-analyzed parts is mentioned; their text is
/// not repeated.
pub fn continuation_prompt(content: &str, urls_json: &str, already_analyzed: usize) -> String {
    let part = already_analyzed + 1;
    format!(
        "I am giving you the NEXT part of the content extracted from a website and a dictionary mapping titles to their URLs.\n\n\
NOTE: this is part {part}; {done} part(s) have already been analyzed. Treat this part as a complement \
to them and keep the same structure and format.\n\n\
{brief}\n\n\
URL dictionary (title -> url):\n{urls}\n\n\
SITE CONTENT (PART {part}):\n{content}\n",
        part = part,
        done = already_analyzed,
        brief = ANALYSIS_BRIEF,
        urls = urls_json,
        content = content
    )
}

/// Prompt merging every partial analysis, embedded verbatim
pub fn unification_prompt(parts: &[PartialAnalysis], urls: &BTreeMap<String, String>) -> String {
    let total = parts.len();
    let analyses = parts
        .iter()
        .map(|p| format!("### PARTIAL ANALYSIS {}/{} ###\n\n{}", p.index, total, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "A website was analyzed in {total} parts because of its size. Merge the partial analyses below \
into ONE unified document giving a complete view of the site.\n\n\
Structure:\n\
1. Introduction: what the site is and what it is for.\n\
2. Complete site tree: every category and sub-category with description and link, and every \
product mentioned in any part with its full details and link.\n\
3. Detailed analysis per category.\n\
4. Relations and integrations between products.\n\
5. Conclusion.\n\n\
Keep every detail from the partial analyses and cite sources as [Name](URL).\n\n\
Complete URL dictionary (title -> url):\n{urls}\n\n\
PARTIAL ANALYSES TO MERGE:\n{analyses}\n",
        total = total,
        urls = url_lookup_json(urls),
        analyses = analyses
    )
}
