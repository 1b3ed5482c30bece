//! Storage module for persisting crawl data
//!
//! This module handles:
//! - The in-memory [`Corpus`] built by a crawl
//! - Its JSON representation (an object keyed by zero-padded page ids)
//! - Writing and reading corpus files

mod json;
mod traits;

pub use json::JsonStorage;
pub use traits::{CorpusStore, StorageError, StorageResult};

use crate::content::PageRecord;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Width of the zero-padded page identifier
const ID_WIDTH: usize = 5;

/// Pages keyed by a sequential identifier, in discovery order
///
/// Keys are assigned on insert (`00000`, `00001`, ...). Iteration, JSON
/// output and JSON input all preserve insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    entries: Vec<(String, PageRecord)>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page and returns the identifier assigned to it
    pub fn insert(&mut self, page: PageRecord) -> String {
        let id = format!("{:0width$}", self.entries.len(), width = ID_WIDTH);
        self.entries.push((id.clone(), page));
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PageRecord> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, page)| page)
    }

    /// `(id, page)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PageRecord)> {
        self.entries.iter().map(|(id, page)| (id.as_str(), page))
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.entries.iter().map(|(_, page)| page)
    }

    /// Rebuilds the corpus with every page passed through `f`, keeping ids
    pub fn map_pages<F>(&self, mut f: F) -> Corpus
    where
        F: FnMut(&PageRecord) -> PageRecord,
    {
        Corpus {
            entries: self
                .entries
                .iter()
                .map(|(id, page)| (id.clone(), f(page)))
                .collect(),
        }
    }

    /// Parses a corpus from its JSON text
    ///
    /// The top level must be an object; its key order is kept.
    pub fn from_json_str(raw: &str) -> StorageResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(StorageError::Shape(format!(
                "expected an object keyed by page id, found {}",
                json_kind(&value)
            )));
        }
        Ok(serde_json::from_str(raw)?)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl Serialize for Corpus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, page) in &self.entries {
            map.serialize_entry(id, page)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Corpus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CorpusVisitor;

        impl<'de> Visitor<'de> for CorpusVisitor {
            type Value = Corpus;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from page id to page record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Corpus, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, page)) = access.next_entry::<String, PageRecord>()? {
                    entries.push((id, page));
                }
                Ok(Corpus { entries })
            }
        }

        deserializer.deserialize_map(CorpusVisitor)
    }
}

impl FromIterator<PageRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = PageRecord>>(iter: I) -> Self {
        let mut corpus = Corpus::new();
        for page in iter {
            corpus.insert(page);
        }
        corpus
    }
}
