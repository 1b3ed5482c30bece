//! HTML parser for extracting page data and links
//!
//! This module turns raw markup into everything the crawl loop needs:
//! - Page title and `<meta>` metadata
//! - The structured content tree (see [`crate::content`])
//! - Normalized outbound links

use crate::content::{extract_page_content, ContentNode};
use crate::url::normalize_url;
use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (empty when there is no `<title>`)
    pub title: String,

    /// `<meta>` name/property -> content
    pub metadata: BTreeMap<String, String>,

    /// Structured main content
    pub content: Vec<ContentNode>,

    /// Normalized absolute links, in document order (duplicates kept)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts page data
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - Empty and fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - `<a href="..." download>`
/// - Anything that does not resolve to http(s)
///
/// Links are resolved against `page_url` and normalized.
///
/// # Example
///
/// ```
/// use site_digest::crawler::parse_page;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page/">Link</a></body></html>"#;
/// let parsed = parse_page(html, "https://example.com");
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_page(html: &str, page_url: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        metadata: extract_metadata(&document),
        content: extract_page_content(&document),
        links: extract_links(&document, page_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Collects `<meta>` tags that carry both a key (`name` or `property`) and `content`
fn extract_metadata(document: &Html) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    if let Ok(meta_selector) = Selector::parse("meta") {
        for element in document.select(&meta_selector) {
            let attrs = element.value();
            let key = attrs
                .attr("name")
                .filter(|k| !k.is_empty())
                .or_else(|| attrs.attr("property").filter(|k| !k.is_empty()));

            if let (Some(key), Some(content)) = (key, attrs.attr("content")) {
                if !content.is_empty() {
                    metadata.insert(key.to_string(), content.to_string());
                }
            }
        }
    }

    metadata
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, page_url: &str) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, page_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, page_url: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let normalized = normalize_url(href, page_url);
    if normalized.starts_with("http://") || normalized.starts_with("https://") {
        Some(normalized)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://example.com/page";

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        assert_eq!(parse_page(html, PAGE).title, "Test Page");
    }

    #[test]
    fn test_multiline_title_is_collapsed() {
        let html = "<html><head><title>\n    Acme\n    Shop\t | Home\n</title></head></html>";
        let parsed = parse_page(html, "https://example.com");
        assert_eq!(parsed.title, "Acme Shop | Home");
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(parse_page(html, PAGE).title, "");
    }

    #[test]
    fn test_extract_metadata() {
        let html = r#"<html><head>
            <meta name="description" content="A site">
            <meta property="og:title" content="OG Title">
            <meta charset="utf-8">
            <meta name="empty" content="">
        </head><body></body></html>"#;

        let parsed = parse_page(html, PAGE);
        assert_eq!(parsed.metadata.len(), 2);
        assert_eq!(parsed.metadata["description"], "A site");
        assert_eq!(parsed.metadata["og:title"], "OG Title");
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let parsed = parse_page(html, PAGE);
        assert_eq!(parsed.links, vec!["https://other.com/page".to_string()]);
    }

    #[test]
    fn test_extract_relative_links_are_normalized() {
        let html = r#"<html><body>
            <a href="/other/">Root relative</a>
            <a href="sibling#part">Path relative</a>
        </body></html>"#;
        let parsed = parse_page(html, PAGE);
        assert_eq!(
            parsed.links,
            vec![
                "https://example.com/other".to_string(),
                "https://example.com/sibling".to_string()
            ]
        );
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r#"<html><body>
            <a href="javascript:void(0)">JS</a>
            <a href="JavaScript:alert(1)">JS caps</a>
            <a href="mailto:test@example.com">Email</a>
            <a href="tel:+1234567890">Call</a>
            <a href="data:text/html,hi">Data</a>
            <a href="ftp://example.com/file">FTP</a>
        </body></html>"#;
        assert!(parse_page(html, PAGE).links.is_empty());
    }

    #[test]
    fn test_skip_fragment_empty_and_download() {
        let html = r##"<html><body>
            <a href="#section">Jump</a>
            <a href="">Empty</a>
            <a href="/file.pdf" download>Download</a>
        </body></html>"##;
        assert!(parse_page(html, PAGE).links.is_empty());
    }

    #[test]
    fn test_duplicate_links_are_kept() {
        let html = r#"<html><body><a href="/a">1</a><a href="/a/">2</a></body></html>"#;
        let parsed = parse_page(html, PAGE);
        assert_eq!(parsed.links.len(), 2);
        assert_eq!(parsed.links[0], parsed.links[1]);
    }

    #[test]
    fn test_content_is_extracted() {
        let html = r#"<html><body><main><h1>Hi</h1><p>Text</p></main></body></html>"#;
        let parsed = parse_page(html, PAGE);
        assert_eq!(
            parsed.content,
            vec![ContentNode::heading(1, "Hi"), ContentNode::paragraph("Text")]
        );
    }
}
