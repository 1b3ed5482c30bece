//! Corpus flattening
//!
//! Turns the page tree into the ordered line stream the chunker consumes,
//! plus a lookup from every page title and heading to its page URL.
//!
//! | Node | Line |
//! |------|------|
//! | page boundary | `### Page: {title}\nURL: {url}\n` |
//! | heading | `\n## {text}` |
//! | paragraph | `{text}` |
//! | list | `\n- {item}\n- {item}\n` |
//! | image | `[Image: {alt}]({src})` |
//!
//! Containers contribute the lines of their children in order.

use crate::content::{ContentNode, PageRecord};
use crate::storage::Corpus;
use std::collections::BTreeMap;

pub const PAGE_MARKER: &str = "### Page: ";
pub const HEADING_MARKER: &str = "\n## ";
const URL_PREFIX: &str = "URL: ";

/// Flattened corpus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatCorpus {
    pub lines: Vec<String>,
    pub title_to_url: BTreeMap<String, String>,
}

impl FlatCorpus {
    /// All lines joined with newlines, as embedded in a prompt
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

/// True for lines that open a section (page boundary or heading)
pub fn is_heading_line(line: &str) -> bool {
    line.starts_with(HEADING_MARKER) || line.starts_with(PAGE_MARKER.trim_end())
}

/// Splits a page marker line into its title and URL
pub fn parse_page_marker(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(PAGE_MARKER)?;
    let url_line = format!("\n{}", URL_PREFIX);
    let (title, url) = match rest.rsplit_once(url_line.as_str()) {
        Some((title, tail)) => (title, tail.lines().next().unwrap_or_default()),
        None => (rest.trim_end_matches('\n'), ""),
    };
    Some((title, url))
}

/// Heading text of a `\n## ` line
pub fn heading_text(line: &str) -> Option<&str> {
    line.strip_prefix(HEADING_MARKER)
}

/// Drops metadata and hoists container children to the top level
///
/// Headings, paragraphs and lists survive in document order. Top-level
/// images with a source keep `src` and `alt`; images inside containers are
/// dropped.
pub fn optimize_corpus(corpus: &Corpus) -> Corpus {
    corpus.map_pages(|page| {
        let mut content = Vec::new();
        hoist_text_nodes(&page.content, true, &mut content);
        PageRecord {
            url: page.url.clone(),
            title: page.title.clone(),
            metadata: BTreeMap::new(),
            content,
            fetched_at: page.fetched_at,
        }
    })
}

fn hoist_text_nodes(nodes: &[ContentNode], top_level: bool, out: &mut Vec<ContentNode>) {
    for node in nodes {
        match node {
            ContentNode::Heading { .. } | ContentNode::Paragraph { .. } | ContentNode::List { .. } => {
                out.push(node.clone())
            }
            ContentNode::Container { children, .. } => hoist_text_nodes(children, false, out),
            ContentNode::Image { src, alt, .. } if top_level && !src.is_empty() => {
                out.push(ContentNode::Image {
                    src: src.clone(),
                    alt: alt.clone(),
                    title: None,
                })
            }
            ContentNode::Image { .. } => {}
        }
    }
}

/// Renders every page of `corpus` into lines, in corpus order
pub fn flatten_corpus(corpus: &Corpus) -> FlatCorpus {
    let mut flat = FlatCorpus::default();

    for page in corpus.pages() {
        // Loaded corpora may carry titles with embedded line breaks
        let title = page.title.split_whitespace().collect::<Vec<_>>().join(" ");
        flat.lines
            .push(format!("{}{}\n{}{}\n", PAGE_MARKER, title, URL_PREFIX, page.url));
        flat.title_to_url.insert(title, page.url.clone());
        flatten_nodes(&page.content, &page.url, &mut flat);
    }

    flat
}

fn flatten_nodes(nodes: &[ContentNode], url: &str, flat: &mut FlatCorpus) {
    for node in nodes {
        match node {
            ContentNode::Heading { text, .. } => {
                flat.lines.push(format!("{}{}", HEADING_MARKER, text));
                flat.title_to_url.insert(text.clone(), url.to_string());
            }
            ContentNode::Paragraph { text } => flat.lines.push(text.clone()),
            ContentNode::List { items, .. } => {
                let body: String = items.iter().map(|item| format!("\n- {}", item)).collect();
                flat.lines.push(format!("{}\n", body));
            }
            ContentNode::Image { src, alt, .. } => {
                flat.lines.push(format!("[Image: {}]({})", alt, src));
            }
            ContentNode::Container { children, .. } => flatten_nodes(children, url, flat),
        }
    }
}
