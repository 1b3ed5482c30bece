//! Hierarchical content extraction from parsed HTML
//!
//! # Extraction Rules
//!
//! - `h1`..`h6` become headings
//! - `p` becomes a paragraph when its trimmed text is non-empty
//! - `ul`/`ol` become lists of the trimmed text of their *direct* `li` children
//! - `img` with a non-empty `src` becomes an image
//! - `div`, `section` and `article` recurse and are kept only when they
//!   yield at least one node
//!
//! Everything else (text nodes, nav, tables, scripts, ...) is skipped.

use crate::content::{ContentNode, ListKind};
use scraper::{ElementRef, Html, Selector};

/// Candidate roots for the main content, in priority order
const MAIN_CONTENT_SELECTORS: &[&str] = &["main", "article", "div.content", "body"];

/// Tags that group blocks and are descended into
const CONTAINER_TAGS: &[&str] = &["div", "section", "article"];

/// Picks the element holding the page's main content
///
/// Priority: `<main>`, then `<article>`, then `<div class="content">`, then `<body>`.
pub fn select_main_content(document: &Html) -> Option<ElementRef<'_>> {
    MAIN_CONTENT_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next()
    })
}

/// Extracts the content tree of a whole document
pub fn extract_page_content(document: &Html) -> Vec<ContentNode> {
    let mut content = Vec::new();
    if let Some(root) = select_main_content(document) {
        extract_content(root, &mut content);
    }
    content
}

/// Appends the content nodes found among `element`'s children to `out`, in document order
pub fn extract_content(element: ElementRef<'_>, out: &mut Vec<ContentNode>) {
    for child in element.children().filter_map(ElementRef::wrap) {
        let tag = child.value().name();

        if let Some(level) = heading_level(tag) {
            out.push(ContentNode::heading(level, element_text(child)));
            continue;
        }

        match tag {
            "p" => {
                let text = element_text(child);
                if !text.is_empty() {
                    out.push(ContentNode::Paragraph { text });
                }
            }
            "ul" | "ol" => {
                let items: Vec<String> = child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|item| item.value().name() == "li")
                    .map(element_text)
                    .collect();

                if !items.is_empty() {
                    let kind = if tag == "ol" {
                        ListKind::Ordered
                    } else {
                        ListKind::Unordered
                    };
                    out.push(ContentNode::List { kind, items });
                }
            }
            "img" => {
                let attrs = child.value();
                if let Some(src) = attrs.attr("src").filter(|src| !src.trim().is_empty()) {
                    out.push(ContentNode::Image {
                        src: src.to_string(),
                        alt: attrs.attr("alt").unwrap_or_default().to_string(),
                        title: attrs.attr("title").map(str::to_string),
                    });
                }
            }
            _ if CONTAINER_TAGS.contains(&tag) => {
                let mut children = Vec::new();
                extract_content(child, &mut children);
                if !children.is_empty() {
                    out.push(ContentNode::Container {
                        tag: tag.to_string(),
                        children,
                    });
                }
            }
            _ => {}
        }
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
