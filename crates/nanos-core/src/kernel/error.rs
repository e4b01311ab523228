//! # Nanos Kernel Errors
//!
//! Defines error types specific to the boot kernel.
//!
//! [`Error`] is the primary enum. It covers binding store misuse (frozen
//! writes, unbound keys, cyclic resolution), credential loading, catalog
//! loading and the fatal boot failures, and wraps the typed errors of the
//! storage and catalog subsystems.
use std::error::Error as StdError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use crate::catalog::error::CatalogError;
use crate::storage::error::StorageSystemError;
use thiserror::Error as ThisError;

/// Custom error type for the Nanos kernel
#[derive(Debug, ThisError)]
pub enum Error {
    /// A write reached a store that has already been frozen.
    #[error("Binding store is frozen; cannot bind '{key}'")]
    FrozenStore { key: String },

    /// No value or factory is bound under the key.
    #[error("No binding for '{key}'")]
    UnboundKey { key: String },

    /// `freeze` was called on a store that is already frozen.
    #[error("Binding store is already frozen")]
    AlreadyFrozen,

    /// A producer resolved its own key while constructing it.
    #[error("Cyclic resolution of '{key}': its producer depends on itself")]
    CyclicResolution { key: String },

    /// The bound value is not of the requested type.
    #[error("Binding '{key}' does not hold a value of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// Credential material could not be loaded. Deliberately opaque.
    #[error("Failed to load credential store: {source}")]
    CredentialLoad {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A catalog record could not be understood. Logged and skipped at boot.
    #[error("Malformed service descriptor at line {line}: {reason}")]
    MalformedDescriptor { line: usize, reason: String },

    /// An eager service failed to start; the whole boot is aborted.
    #[error("Eager start of service '{service}' failed: {source}")]
    EagerStart {
        service: String,
        #[source]
        source: Box<Error>,
    },

    /// A startup argument was not recognized.
    #[error("Unknown argument {0}")]
    UnrecognizedArgument(String),

    /// The startup routine itself failed.
    #[error("Startup routine '{routine}' failed: {source}")]
    RoutineFailed {
        routine: String,
        #[source]
        source: Box<Error>,
    },

    /// Error occurring during a specific boot phase.
    #[error("Kernel lifecycle error during {phase:?}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        message: String,
    },

    /// Specific, typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Specific, typed descriptor catalog error
    #[error("Service catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a specific phase of the boot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Init")]
    Init,
    #[error("FoundationsLoaded")]
    FoundationsLoaded,
    #[error("CatalogRegistered")]
    CatalogRegistered,
    #[error("Frozen")]
    Frozen,
    #[error("ServicesStarted")]
    ServicesStarted,
    #[error("ScriptRun")]
    ScriptRun,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Helper to create an I/O error with operation and path context
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }

    /// Wrap any failure into the opaque credential load error
    pub fn credential_load(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Error::CredentialLoad { source: source.into() }
    }
}
