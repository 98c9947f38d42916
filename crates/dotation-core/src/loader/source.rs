//! Where catalog documents come from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{CatalogError, CatalogResult};

/// A read-only provider of the static catalog documents.
pub trait CatalogSource {
    /// Fetch one document by file name.
    fn fetch(&self, name: &str) -> CatalogResult<String>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Reads catalog documents from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl CatalogSource for DirectorySource {
    fn fetch(&self, name: &str) -> CatalogResult<String> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(CatalogError::Missing(name.to_string()));
        }
        std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            file: name.to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Documents handed over in memory, e.g. fetched by an application shell.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, content: impl Into<String>) -> Self {
        self.documents.insert(name.to_string(), content.into());
        self
    }
}

impl CatalogSource for MemorySource {
    fn fetch(&self, name: &str) -> CatalogResult<String> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::Missing(name.to_string()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
