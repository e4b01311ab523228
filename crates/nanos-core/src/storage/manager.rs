use std::fmt::Debug;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::kernel::error::Result;
use crate::storage::local::LocalStorageProvider;
use crate::storage::provider::StorageProvider;

/// Storage handle bound into the root context.
///
/// Wraps a [`StorageProvider`] rooted at the data directory given at startup.
/// Every file the kernel touches (the service journal, the credential files)
/// is resolved through this handle.
#[derive(Clone)]
pub struct Storage {
    provider: Arc<dyn StorageProvider>,
    data_dir: PathBuf,
}

impl Storage {
    /// Create a storage handle backed by the local filesystem.
    /// An empty `data_dir` means the process working directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let provider = Arc::new(LocalStorageProvider::new(data_dir.clone()));
        Self { provider, data_dir }
    }

    /// Get the underlying provider
    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    /// The data directory this handle was created with
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Ensure the data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Ok(());
        }
        self.provider.create_dir_all(Path::new(""))
    }
}

impl Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("provider", &self.provider.name())
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

// Implement StorageProvider by delegating to the internal provider
impl StorageProvider for Storage {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn exists(&self, path: &Path) -> bool {
        self.provider.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.provider.create_dir_all(path)
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.provider.open_read(path)
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        self.provider.open_append(path)
    }
}
