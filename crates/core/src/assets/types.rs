//! Asset types and data structures.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Content type recorded when the client declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A fully buffered file received for direct upload.
///
/// The buffer is read once to hash it and again for the transfer.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original filename as sent by the client.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

/// Returned after a direct upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDescriptor {
    /// Content token (SHA-256 hex of the content).
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// Public URL of the stored object.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// Declared MIME type.
    pub mime_type: String,
    /// When the upload completed.
    pub created_at: DateTime<Utc>,
}

/// Returned for a delegated (presigned) upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignDescriptor {
    /// Presigned PUT URL.
    pub url: String,
    /// Storage key the URL writes to.
    pub key: String,
    /// Advisory expiry; the URL's own signature is authoritative.
    pub expires_at: DateTime<Utc>,
}

/// One entry of an asset listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    /// Final key segment, usable with get and delete.
    pub id: String,
    /// Full storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time reported by the store.
    pub last_modified: Option<DateTime<Utc>>,
    /// Public URL.
    pub url: String,
}

/// Metadata of a single asset resolved by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetMetadata {
    /// Final key segment.
    pub id: String,
    /// Full storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type recorded by the store.
    pub mime_type: Option<String>,
    /// Last modification time reported by the store.
    pub last_modified: Option<DateTime<Utc>>,
    /// Public URL.
    pub url: String,
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct AssetSettings {
    /// Base URL asset keys are appended to (no trailing slash).
    pub public_base_url: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: u64,
    /// Validity of presigned upload URLs.
    pub presign_ttl: Duration,
}

impl AssetSettings {
    /// Default upload cap: 100 MiB.
    pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;
    /// Default presign validity: 15 minutes.
    pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);
    /// Longest validity S3 accepts for a presigned URL: 7 days.
    pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Create settings with default limits.
    #[must_use]
    pub fn new(public_base_url: impl Into<String>) -> Self {
        let mut base: String = public_base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            public_base_url: base,
            max_upload_bytes: Self::DEFAULT_MAX_UPLOAD_BYTES,
            presign_ttl: Self::DEFAULT_PRESIGN_TTL,
        }
    }

    /// Set the upload cap.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Set the presign validity, capped at [`Self::MAX_PRESIGN_TTL`].
    #[must_use]
    pub fn with_presign_ttl(mut self, ttl: Duration) -> Self {
        self.presign_ttl = ttl.min(Self::MAX_PRESIGN_TTL);
        self
    }

    /// Public URL for a storage key.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}
