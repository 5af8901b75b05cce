//! Error types for the lock core

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::surface::SurfaceError;

/// Result type alias for lock operations
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors that can stop a lock session from starting or running
#[derive(Debug, Error)]
pub enum LockError {
    /// Credential store could not provide a reference digest
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The lock surface could not be set up or torn down
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input stream ended while the session was still locked
    #[error("Input stream closed while locked")]
    InputClosed,
}
