//! Structured page content
//!
//! A page is stored as an ordered tree of [`ContentNode`] values. The JSON
//! shape mirrors the corpus files produced by earlier scrapers of this
//! project: every node carries a `type` tag (`h1`..`h6`, `paragraph`, `list`,
//! `image`, `container`).

mod extract;

pub use extract::{extract_content, extract_page_content, select_main_content};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// One extracted page, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    #[serde(default)]
    pub content: Vec<ContentNode>,

    /// Fetch time, persisted as fractional Unix seconds
    #[serde(rename = "timestamp", with = "unix_seconds", default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

/// Ordering of a list node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    #[default]
    Unordered,
}

/// A typed content element
///
/// Containers never hold an empty `children` vector; the extractor prunes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNode", into = "WireNode")]
pub enum ContentNode {
    Heading {
        /// 1 through 6
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    List {
        kind: ListKind,
        items: Vec<String>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    Container {
        tag: String,
        children: Vec<ContentNode>,
    },
}

impl ContentNode {
    /// Builds a heading, clamping the level into 1..=6
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level: level.clamp(1, 6),
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }
}

/// Serialized form of [`ContentNode`]
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireNode {
    H1 {
        text: String,
    },
    H2 {
        text: String,
    },
    H3 {
        text: String,
    },
    H4 {
        text: String,
    },
    H5 {
        text: String,
    },
    H6 {
        text: String,
    },
    Paragraph {
        text: String,
    },
    List {
        #[serde(default)]
        list_type: ListKind,
        #[serde(default)]
        items: Vec<String>,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Container {
        tag: String,
        #[serde(default)]
        children: Vec<ContentNode>,
    },
}

impl From<WireNode> for ContentNode {
    fn from(wire: WireNode) -> Self {
        match wire {
            WireNode::H1 { text } => ContentNode::heading(1, text),
            WireNode::H2 { text } => ContentNode::heading(2, text),
            WireNode::H3 { text } => ContentNode::heading(3, text),
            WireNode::H4 { text } => ContentNode::heading(4, text),
            WireNode::H5 { text } => ContentNode::heading(5, text),
            WireNode::H6 { text } => ContentNode::heading(6, text),
            WireNode::Paragraph { text } => ContentNode::Paragraph { text },
            WireNode::List { list_type, items } => ContentNode::List {
                kind: list_type,
                items,
            },
            WireNode::Image { src, alt, title } => ContentNode::Image { src, alt, title },
            WireNode::Container { tag, children } => ContentNode::Container { tag, children },
        }
    }
}

impl From<ContentNode> for WireNode {
    fn from(node: ContentNode) -> Self {
        match node {
            ContentNode::Heading { level, text } => match level {
                1 => WireNode::H1 { text },
                2 => WireNode::H2 { text },
                3 => WireNode::H3 { text },
                4 => WireNode::H4 { text },
                5 => WireNode::H5 { text },
                _ => WireNode::H6 { text },
            },
            ContentNode::Paragraph { text } => WireNode::Paragraph { text },
            ContentNode::List { kind, items } => WireNode::List {
                list_type: kind,
                items,
            },
            ContentNode::Image { src, alt, title } => WireNode::Image { src, alt, title },
            ContentNode::Container { tag, children } => WireNode::Container { tag, children },
        }
    }
}

/// Fractional Unix seconds <-> `DateTime<Utc>`
pub(crate) mod unix_seconds {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.timestamp_millis() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Utc.timestamp_millis_opt((seconds * 1000.0).round() as i64)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", seconds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_heading_serializes_with_level_tag() {
        let node = ContentNode::heading(2, "Products");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value, json!({"type": "h2", "text": "Products"}));
    }

    #[test]
    fn test_heading_level_is_clamped() {
        assert_eq!(
            ContentNode::heading(9, "Deep"),
            ContentNode::Heading {
                level: 6,
                text: "Deep".to_string()
            }
        );
    }

    #[test]
    fn test_list_uses_list_type_key() {
        let node = ContentNode::List {
            kind: ListKind::Ordered,
            items: vec!["one".to_string(), "two".to_string()],
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({"type": "list", "list_type": "ordered", "items": ["one", "two"]})
        );
    }

    #[test]
    fn test_nested_container_parses() {
        let raw = json!({
            "type": "container",
            "tag": "section",
            "children": [
                {"type": "h3", "text": "Specs", "children": []},
                {"type": "list", "items": ["a"]},
                {"type": "image", "src": "/x.png"}
            ]
        });

        let node: ContentNode = serde_json::from_value(raw).unwrap();
        match &node {
            ContentNode::Container { tag, children } => {
                assert_eq!(tag, "section");
                assert_eq!(children.len(), 3);
                assert_eq!(children[0], ContentNode::heading(3, "Specs"));
                assert_eq!(
                    children[1],
                    ContentNode::List {
                        kind: ListKind::Unordered,
                        items: vec!["a".to_string()]
                    }
                );
                assert_eq!(
                    children[2],
                    ContentNode::Image {
                        src: "/x.png".to_string(),
                        alt: String::new(),
                        title: None
                    }
                );
            }
            other => panic!("expected container, got {:?}", other),
        }
    }

    #[test]
    fn test_page_record_timestamp_is_unix_seconds() {
        let fetched_at = Utc.timestamp_millis_opt(1_700_000_000_500).unwrap();
        let page = PageRecord {
            url: "https://example.com".to_string(),
            title: "Home".to_string(),
            metadata: BTreeMap::new(),
            content: vec![ContentNode::paragraph("Hello")],
            fetched_at,
        };

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["timestamp"], json!(1_700_000_000.5));

        let back: PageRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.fetched_at, fetched_at);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let raw = json!({"type": "table", "rows": []});
        assert!(serde_json::from_value::<ContentNode>(raw).is_err());
    }
}
