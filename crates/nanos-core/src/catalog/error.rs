//! # Nanos Catalog Errors
//!
//! Errors raised by the service descriptor catalog and its decorators.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Permission '{permission}' required for '{operation}'")]
    AuthorizationDenied { operation: String, permission: String },

    #[error("Service catalog is not available yet")]
    Unavailable,

    #[error("Invalid service descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    #[error("Failed to encode journal record: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}
