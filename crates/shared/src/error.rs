//! Application-wide error types.

use thiserror::Error;

use crate::jwt::JwtError;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, forged or expired credential.
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    /// Upload exceeds the configured size cap.
    #[error("Payload too large: {size} bytes exceeds maximum {max} bytes")]
    PayloadTooLarge {
        /// Observed size (at least `max + 1` when reading stopped early).
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Malformed request body or missing field.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backing object store failed.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Per-client request budget exhausted.
    #[error("Rate limited: {client}, retry in {retry_after_secs}s")]
    TooManyRequests {
        /// Limiter key of the client.
        client: String,
        /// Seconds until the current window resets.
        retry_after_secs: u64,
    },
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::PayloadTooLarge { .. } | Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::TooManyRequests { .. } => 429,
            Self::StorageUnavailable(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::TooManyRequests { .. } => "RATE_LIMITED",
        }
    }

    /// Returns the message shown to callers.
    ///
    /// Credential sub-cases and backend details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthenticated(_) => "Invalid or missing credentials".to_string(),
            Self::PayloadTooLarge { max, .. } => format!("File too large (maximum {max} bytes)"),
            Self::BadRequest(msg) => msg.clone(),
            Self::NotFound(_) => "Asset not found".to_string(),
            Self::StorageUnavailable(_) => "Storage operation failed".to_string(),
            Self::TooManyRequests { .. } => "Too many requests, slow down".to_string(),
        }
    }

    /// Whether the cause should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        Self::Unauthenticated(err.to_string())
    }
}


#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
