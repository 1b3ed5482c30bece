//! JSON file storage implementation
//!
//! The corpus is written as one pretty-printed JSON object keyed by page id.

use crate::storage::traits::{CorpusStore, StorageError, StorageResult};
use crate::storage::Corpus;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON file backend
#[derive(Debug, Clone)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    /// Creates a backend writing to `path`
    ///
    /// Parent directories are created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend for `<directory>/<file_name>`
    pub fn in_directory(directory: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(directory.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusStore for JsonStorage {
    fn save(&self, corpus: &Corpus) -> StorageResult<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(corpus)?;
        fs::write(&self.path, json).map_err(|e| StorageError::io(&self.path, e))?;

        tracing::info!("Saved {} pages to {}", corpus.len(), self.path.display());
        Ok(self.path.clone())
    }

    fn load(&self) -> StorageResult<Corpus> {
        let raw = fs::read_to_string(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let corpus = Corpus::from_json_str(&raw)?;
        tracing::debug!("Loaded {} pages from {}", corpus.len(), self.path.display());
        Ok(corpus)
    }
}
