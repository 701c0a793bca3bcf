//! Error types for the cleanup service
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cleanup Error Enum ==
/// Unified error type for the cleanup service.
#[derive(Error, Debug)]
pub enum CleanupError {
    /// Filesystem failure while listing or removing temp files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Query failure reported by the persistence layer
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Another instance holds the lease for this operation
    #[error("Lock denied: {name} is held by another instance")]
    LockDenied { name: String },

    /// The lock coordinator itself failed
    #[error("Lock error: {0}")]
    Lock(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cleanup service.
pub type Result<T> = std::result::Result<T, CleanupError>;
