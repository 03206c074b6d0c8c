//! Object store implementation using Apache OpenDAL.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::gateway::{ObjectMeta, ObjectPage, ObjectStore};

/// OpenDAL-backed object store.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    fn supports_start_after(&self) -> bool {
        self.operator.info().full_capability().list_with_start_after
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        let mut write = self.operator.write_with(key, body);
        if self.operator.info().full_capability().write_with_content_type {
            write = write.content_type(content_type);
        }
        write.await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError> {
        let meta = self.operator.stat(key).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::not_found(key),
            _ => StorageError::from(e),
        })?;

        Ok(ObjectMeta {
            key: key.to_string(),
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
            last_modified: meta.last_modified().and_then(to_utc),
        })
    }

    async fn list_page(
        &self,
        prefix: &str,
        start_after: Option<String>,
    ) -> Result<ObjectPage, StorageError> {
        // Backends without `start_after` cannot resume, so they return the
        // whole listing as a single page.
        let paged = self.supports_start_after();
        let page_size = if paged {
            self.config.list_page_size
        } else {
            usize::MAX
        };

        let mut request = self.operator.lister_with(prefix).recursive(true);
        if paged && let Some(after) = start_after.as_deref() {
            request = request.start_after(after);
        }
        let mut lister = request.await.map_err(StorageError::from)?;

        // Listers such as fs leave size and mtime unset on their entries.
        let capability = self.operator.info().full_capability();
        let needs_stat = !capability.list_has_content_length || !capability.list_has_last_modified;

        let mut objects = Vec::new();
        while let Some(entry) = lister.try_next().await.map_err(StorageError::from)? {
            if entry.metadata().is_dir() {
                continue;
            }
            let meta = if needs_stat {
                match self.operator.stat(entry.path()).await {
                    Ok(meta) => meta,
                    // Removed between listing and stat.
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                }
            } else {
                entry.metadata().clone()
            };
            objects.push(ObjectMeta {
                key: entry.path().to_string(),
                size: meta.content_length(),
                content_type: meta.content_type().map(String::from),
                last_modified: meta.last_modified().and_then(to_utc),
            });
            if objects.len() >= page_size {
                break;
            }
        }

        let next_start_after = if objects.len() >= page_size {
            objects.last().map(|o| o.key.clone())
        } else {
            None
        };
        debug!(
            prefix = %prefix,
            count = objects.len(),
            more = next_start_after.is_some(),
            "Listed storage page"
        );

        Ok(ObjectPage {
            objects,
            next_start_after,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    async fn presign_put(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let presigned = self
            .operator
            .presign_write(key, ttl)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Unsupported => StorageError::PresignNotSupported,
                _ => StorageError::from(e),
            })?;

        Ok(presigned.uri().to_string())
    }
}

/// Converts a store timestamp into UTC via its RFC 3339 rendering.
fn to_utc(ts: impl std::fmt::Display) -> Option<DateTime<Utc>> {
    ts.to_string().parse::<DateTime<Utc>>().ok()
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mediagate-{name}-{}", std::process::id()))
    }

    #[test]
    fn test_to_utc_parses_rfc3339() {
        let parsed = to_utc("2024-06-14T17:30:00Z").expect("should parse");
        assert_eq!(parsed.timestamp(), 1_718_386_200);
        assert!(to_utc("not a date").is_none());
    }

    #[test]
    fn test_from_config_local() {
        let config = StorageConfig::new(StorageProvider::local_fs(temp_root("cfg")));
        let service = StorageService::from_config(config).expect("should create service");
        assert_eq!(service.provider_name(), "local");
    }

    #[tokio::test]
    async fn test_local_put_stat_list_delete() {
        let root = temp_root("roundtrip");
        let config = StorageConfig::new(StorageProvider::local_fs(&root));
        let service = StorageService::from_config(config).expect("should create service");

        service
            .put("uploads/u1/abc.txt", Bytes::from_static(b"0123456789"), "text/plain")
            .await
            .expect("put should succeed");

        let meta = service.stat("uploads/u1/abc.txt").await.expect("stat");
        assert_eq!(meta.size, 10);

        let page = service
            .list_page("uploads/u1/", None)
            .await
            .expect("list should succeed");
        let listed = page
            .objects
            .iter()
            .find(|o| o.key == "uploads/u1/abc.txt")
            .expect("object should be listed");
        assert_eq!(listed.size, 10);
        assert!(listed.last_modified.is_some());

        service.delete("uploads/u1/abc.txt").await.expect("delete");
        service
            .delete("uploads/u1/abc.txt")
            .await
            .expect("second delete is idempotent");

        let missing = service.stat("uploads/u1/abc.txt").await;
        assert!(matches!(missing, Err(StorageError::NotFound { .. })));

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_local_presign_not_supported() {
        let config = StorageConfig::new(StorageProvider::local_fs(temp_root("presign")));
        let service = StorageService::from_config(config).expect("should create service");

        let result = service
            .presign_put("uploads/u1/1000.png", Duration::from_secs(900))
            .await;
        assert!(matches!(result, Err(StorageError::PresignNotSupported)));
    }
}
