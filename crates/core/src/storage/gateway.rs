//! Object store capability surface.
//!
//! The orchestrators only ever talk to the backing store through
//! [`ObjectStore`]. Keys are plain strings here; tenancy is enforced by the
//! callers building them with [`crate::keys`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::error::StorageError;

/// Metadata of one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Full storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type recorded by the store, if any.
    pub content_type: Option<String>,
    /// Last modification time reported by the store.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Objects on this page, in key order.
    pub objects: Vec<ObjectMeta>,
    /// Continuation token for the next page; `None` once exhausted.
    pub next_start_after: Option<String>,
}

/// Capabilities the gateway needs from an object store.
///
/// Every call is a network round trip and a cancellation point: dropping
/// the returned future abandons the request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` at `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Fetches object metadata without the body.
    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError>;

    /// Lists one page of objects under `prefix`, starting after the given
    /// continuation token.
    async fn list_page(
        &self,
        prefix: &str,
        start_after: Option<String>,
    ) -> Result<ObjectPage, StorageError>;

    /// Deletes the object at `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Generates a presigned PUT URL for `key`, valid for `ttl`.
    async fn presign_put(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}
