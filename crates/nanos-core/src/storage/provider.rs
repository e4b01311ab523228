use std::fmt::Debug;
use std::io::{Read, Write};
use std::path::Path;
use crate::kernel::error::Result;

/// Trait for storage providers that resolve paths below a root
pub trait StorageProvider: Send + Sync + Debug {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all its parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Open a file for reading
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Open a file for appending, creating it if needed
    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + Send>>;
}
