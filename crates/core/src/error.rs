//! Error taxonomy for path resolution and file writes

use thiserror::Error;

/// Failure to resolve the canonical wallet paths
#[derive(Debug, Error)]
pub enum PathError {
    /// The current user's home directory could not be determined
    #[error("unable to determine the current user's home directory")]
    HomeDirUnavailable,
}

/// Failure while writing or bootstrapping wallet files
#[derive(Debug, Error)]
pub enum StoreError {
    /// The value could not be encoded as JSON; nothing was written
    #[error("failed to encode JSON payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A remove, create, write, or sync operation failed
    #[error("filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),
}
