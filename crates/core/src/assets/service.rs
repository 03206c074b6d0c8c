//! Asset orchestrators: upload, presign, list, get and delete.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info};

use mediagate_shared::CallerIdentity;

use super::error::AssetError;
use super::types::{
    AssetDescriptor, AssetMetadata, AssetSettings, AssetSummary, DEFAULT_CONTENT_TYPE,
    PresignDescriptor, UploadFile,
};
use crate::keys::{self, StorageKey};
use crate::storage::{ObjectMeta, ObjectStore, StorageError};

/// Position of a paginated listing.
enum Cursor {
    Start,
    After(String),
    Done,
}

/// Asset service scoping every store call to the caller's namespace.
pub struct AssetService {
    store: Arc<dyn ObjectStore>,
    settings: AssetSettings,
}

impl AssetService {
    /// Create a new asset service.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, settings: AssetSettings) -> Self {
        Self { store, settings }
    }

    /// Get the settings.
    #[must_use]
    pub fn settings(&self) -> &AssetSettings {
        &self.settings
    }

    /// Rejects sizes above the upload cap.
    ///
    /// Callers reading a body incrementally use this to stop early.
    pub fn check_size(&self, size: u64) -> Result<(), AssetError> {
        let max = self.settings.max_upload_bytes;
        if size > max {
            return Err(AssetError::payload_too_large(size, max));
        }
        Ok(())
    }

    /// Store a file under its content-addressed key.
    ///
    /// Identical content from the same caller always maps to the same key,
    /// so re-uploading overwrites in place.
    pub async fn upload(
        &self,
        caller: &CallerIdentity,
        file: UploadFile,
    ) -> Result<AssetDescriptor, AssetError> {
        let size = u64::try_from(file.data.len()).unwrap_or(u64::MAX);
        self.check_size(size)?;

        let token = keys::content_token(&file.data);
        let key = keys::content_key(caller, &token, &file.filename);
        let mime_type = file
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        self.store.put(key.as_str(), file.data, &mime_type).await?;

        info!(caller = %caller, key = %key, size, "Asset uploaded");

        Ok(AssetDescriptor {
            id: token,
            filename: file.filename,
            url: self.settings.public_url(key.as_str()),
            size,
            mime_type,
            created_at: Utc::now(),
        })
    }

    /// Issue a presigned PUT URL under a timestamp key.
    pub async fn presign(
        &self,
        caller: &CallerIdentity,
        filename: &str,
    ) -> Result<PresignDescriptor, AssetError> {
        self.presign_at(caller, filename, Utc::now()).await
    }

    /// Issue a presigned PUT URL keyed by `now`.
    ///
    /// No object is created; the client performs the PUT. Two requests in
    /// the same second with the same extension get the same key.
    pub async fn presign_at(
        &self,
        caller: &CallerIdentity,
        filename: &str,
        now: DateTime<Utc>,
    ) -> Result<PresignDescriptor, AssetError> {
        let ttl = self.settings.presign_ttl;
        let key = keys::timestamp_key(caller, now, filename);
        let url = self.store.presign_put(key.as_str(), ttl).await?;

        let validity = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(15 * 60));

        debug!(caller = %caller, key = %key, ttl_secs = ttl.as_secs(), "Presigned upload");

        Ok(PresignDescriptor {
            url,
            key: key.to_string(),
            expires_at: now + validity,
        })
    }

    /// Lazily walk every page of the caller's namespace.
    pub fn list_stream<'a>(
        &'a self,
        caller: &'a CallerIdentity,
    ) -> impl Stream<Item = Result<AssetSummary, AssetError>> + 'a {
        let prefix = keys::caller_prefix(caller);

        stream::try_unfold(Cursor::Start, move |cursor| {
            let prefix = prefix.clone();
            async move {
                let start_after = match cursor {
                    Cursor::Start => None,
                    Cursor::After(token) => Some(token),
                    Cursor::Done => return Ok(None),
                };

                let page = self
                    .store
                    .list_page(&prefix, start_after.clone())
                    .await
                    .map_err(AssetError::from)?;

                let next = match page.next_start_after {
                    Some(token) if start_after.as_deref() == Some(token.as_str()) => {
                        return Err(AssetError::Storage(StorageError::operation(format!(
                            "listing did not advance past {token}"
                        ))));
                    }
                    Some(token) => Cursor::After(token),
                    None => Cursor::Done,
                };

                let objects: Vec<ObjectMeta> = page
                    .objects
                    .into_iter()
                    .filter(|o| o.key.starts_with(&prefix))
                    .collect();

                Ok::<_, AssetError>(Some((objects, next)))
            }
        })
        .map_ok(|objects| stream::iter(objects.into_iter().map(Ok::<ObjectMeta, AssetError>)))
        .try_flatten()
        .map_ok(move |object| self.summarize(object))
    }

    /// List every asset in the caller's namespace.
    ///
    /// Continuation is followed until the store reports no more pages; one
    /// failed page fails the whole listing.
    pub async fn list(&self, caller: &CallerIdentity) -> Result<Vec<AssetSummary>, AssetError> {
        let assets: Vec<AssetSummary> = self.list_stream(caller).try_collect().await?;
        debug!(caller = %caller, count = assets.len(), "Listed assets");
        Ok(assets)
    }

    /// Fetch metadata of one asset by id.
    pub async fn get(&self, caller: &CallerIdentity, id: &str) -> Result<AssetMetadata, AssetError> {
        let key = Self::resolve(caller, id)?;

        let meta = self.store.stat(key.as_str()).await.map_err(|e| match e {
            StorageError::NotFound { .. } => AssetError::NotFound(id.to_string()),
            other => AssetError::Storage(other),
        })?;

        Ok(AssetMetadata {
            id: key.file_name().to_string(),
            url: self.settings.public_url(key.as_str()),
            key: meta.key,
            size: meta.size,
            mime_type: meta.content_type,
            last_modified: meta.last_modified,
        })
    }

    /// Delete one asset by id. Deleting a missing asset succeeds.
    pub async fn delete(&self, caller: &CallerIdentity, id: &str) -> Result<(), AssetError> {
        let key = Self::resolve(caller, id)?;

        match self.store.delete(key.as_str()).await {
            Ok(()) | Err(StorageError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        info!(caller = %caller, key = %key, "Asset deleted");
        Ok(())
    }

    fn resolve(caller: &CallerIdentity, id: &str) -> Result<StorageKey, AssetError> {
        keys::asset_key(caller, id).ok_or_else(|| AssetError::InvalidAssetId(id.to_string()))
    }

    fn summarize(&self, object: ObjectMeta) -> AssetSummary {
        let id = object
            .key
            .rsplit('/')
            .next()
            .unwrap_or(object.key.as_str())
            .to_string();

        AssetSummary {
            id,
            url: self.settings.public_url(&object.key),
            key: object.key,
            size: object.size,
            last_modified: object.last_modified,
        }
    }
}
