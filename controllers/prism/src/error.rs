//! Controller-specific error types.
//!
//! This module defines error types specific to the Prism controller that are
//! not covered by the client library's own taxonomy.

use prism_client::PrismError;
use thiserror::Error;

/// Errors that can occur in the Prism controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Prism Central API error
    #[error("Prism error: {0}")]
    Prism(#[from] PrismError),

    /// Invalid or mutually exclusive declared configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Attempted change to an immutable field
    #[error("Immutable field conflict: {0}")]
    Conflict(String),

    /// File I/O error (guest customization content, operation document)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
