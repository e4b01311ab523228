use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use crate::kernel::error::{Error, Result};
use crate::storage::provider::StorageProvider;

/// Local filesystem storage provider rooted at a data directory
#[derive(Clone)]
pub struct LocalStorageProvider {
    base_path: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider with the given base path.
    /// An empty base path resolves against the working directory.
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }
}

impl StorageProvider for LocalStorageProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full_path = self.resolve_path(path);
        fs::create_dir_all(&full_path).map_err(|e| Error::io(e, "create_dir_all", full_path))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let full_path = self.resolve_path(path);
        let file = File::open(&full_path).map_err(|e| Error::io(e, "open_read", full_path))?;
        Ok(Box::new(file))
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let full_path = self.resolve_path(path);
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&full_path)
            .map_err(|e| Error::io(e, "open_append", full_path))?;
        Ok(Box::new(file))
    }
}

impl fmt::Debug for LocalStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorageProvider")
            .field("base_path", &self.base_path)
            .finish()
    }
}
