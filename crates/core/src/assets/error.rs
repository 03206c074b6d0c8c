//! Asset error types.

use thiserror::Error;

use mediagate_shared::AppError;

use crate::storage::StorageError;

/// Asset operation errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Upload exceeds the configured cap.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    PayloadTooLarge {
        /// Actual (or lower bound of the) file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Asset id is not a single key segment.
    #[error("invalid asset id: {0}")]
    InvalidAssetId(String),

    /// Asset does not exist.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Object store call failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AssetError {
    /// Create a payload too large error.
    #[must_use]
    pub fn payload_too_large(size: u64, max: u64) -> Self {
        Self::PayloadTooLarge { size, max }
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::PayloadTooLarge { size, max } => Self::PayloadTooLarge { size, max },
            AssetError::InvalidAssetId(id) => Self::BadRequest(format!("invalid asset id: {id}")),
            AssetError::NotFound(id) => Self::NotFound(id),
            AssetError::Storage(e) => Self::StorageUnavailable(e.to_string()),
        }
    }
}
