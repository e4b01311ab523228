//! # Nanos Storage
//!
//! File access for the kernel, rooted at the data directory passed on the
//! command line. The [`Storage`] handle is the first foundational binding the
//! boot sequencer installs.
pub mod error;
pub mod local;
pub mod manager;
pub mod provider;

/// Re-export key types
pub use provider::StorageProvider;
pub use local::LocalStorageProvider;
pub use manager::Storage;
