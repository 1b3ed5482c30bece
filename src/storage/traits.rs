//! Storage traits and error types

use crate::storage::Corpus;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected corpus shape: {0}")]
    Shape(String),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence backend for a crawl corpus
///
/// The crawler calls [`CorpusStore::save`] exactly once, after the loop ends.
pub trait CorpusStore: Send + Sync {
    /// Writes the whole corpus, replacing any previous content
    ///
    /// Returns the location the corpus was written to.
    fn save(&self, corpus: &Corpus) -> StorageResult<PathBuf>;

    /// Reads a previously saved corpus
    fn load(&self) -> StorageResult<Corpus>;
}
