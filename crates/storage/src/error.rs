//! Storage errors

use greenstone_core::GreenstoneError;
use thiserror::Error;

/// Errors raised while reading or writing the terminal record
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file {path} is corrupted: {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("State nests {depth} levels deep, more than the limit of {limit}")]
    TooDeep { depth: usize, limit: usize },
}

impl From<StorageError> for GreenstoneError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => GreenstoneError::Io(e),
            other => GreenstoneError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
