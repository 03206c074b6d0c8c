//! Storage key derivation.
//!
//! Every object a caller owns lives under `uploads/{caller}/`. The last key
//! segment is a content token followed by the original file extension:
//!
//! - direct uploads use the SHA-256 of the content, so identical bytes from
//!   the same caller land on the same key (idempotent overwrite);
//! - presigned uploads use the unix time in seconds, since no content exists
//!   yet. Two presigns in the same second share a key and the last writer wins.

use std::fmt;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use mediagate_shared::CallerIdentity;

/// Root prefix of every caller namespace.
pub const UPLOAD_ROOT: &str = "uploads";

/// A path-like key addressing one object in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final key segment (content token plus extension).
    #[must_use]
    pub fn file_name(&self) -> &str {
        file_name_of(&self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the listing prefix of a caller's namespace, `uploads/{caller}/`.
#[must_use]
pub fn caller_prefix(caller: &CallerIdentity) -> String {
    format!("{UPLOAD_ROOT}/{caller}/")
}

/// Hex-encoded SHA-256 of the content.
#[must_use]
pub fn content_token(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Key for a direct upload: `uploads/{caller}/{hash}{ext}`.
#[must_use]
pub fn content_key(caller: &CallerIdentity, token: &str, filename: &str) -> StorageKey {
    StorageKey(format!(
        "{}{token}{}",
        caller_prefix(caller),
        extension(filename)
    ))
}

/// Key for a presigned upload: `uploads/{caller}/{unix_seconds}{ext}`.
#[must_use]
pub fn timestamp_key(caller: &CallerIdentity, at: DateTime<Utc>, filename: &str) -> StorageKey {
    StorageKey(format!(
        "{}{}{}",
        caller_prefix(caller),
        at.timestamp(),
        extension(filename)
    ))
}

/// Rebuilds the key of an existing asset from its id (the final key segment).
///
/// Returns `None` if the id is not a single, ordinary path segment, so a
/// caller cannot step outside their own prefix.
#[must_use]
pub fn asset_key(caller: &CallerIdentity, id: &str) -> Option<StorageKey> {
    if !is_plain_segment(id) {
        return None;
    }
    Some(StorageKey(format!("{}{id}", caller_prefix(caller))))
}

/// Extension of the final path element, including the dot.
///
/// Empty if the name has no dot. Kept verbatim otherwise; it can never hold
/// a separator, so it cannot add a key segment.
#[must_use]
pub fn extension(filename: &str) -> &str {
    let name = file_name_of(filename);
    name.rfind('.').map_or("", |idx| &name[idx..])
}

fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}
