//! # Nanos Storage Errors
//!
//! Defines error types specific to the storage layer backing the data
//! directory: file I/O and missing files.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageSystemError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found at path: {0}")]
    FileNotFound(PathBuf),
}

// Helper for creating Io errors, ensuring path is always included.
impl StorageSystemError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return StorageSystemError::FileNotFound(path);
        }
        StorageSystemError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}
