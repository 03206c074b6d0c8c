//! Asset routes: upload, presign, list, get and delete.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    routing::{get, post},
};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, middleware::AuthUser};
use mediagate_core::assets::{
    AssetDescriptor, AssetMetadata, AssetSummary, PresignDescriptor, UploadFile,
};
use mediagate_shared::AppError;

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Room left for multipart boundaries and part headers on top of the file cap.
pub const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Creates the asset routes.
///
/// The upload route accepts bodies up to `max_upload_bytes` plus multipart
/// overhead; every other route keeps the default body limit.
pub fn routes(max_upload_bytes: u64) -> Router<AppState> {
    let body_limit =
        usize::try_from(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/upload",
            post(upload_asset).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/presign", post(presign_upload))
        .route("/assets", get(list_assets))
        .route("/assets/{id}", get(get_asset).delete(delete_asset))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a presigned upload.
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    /// Filename the extension is taken from.
    pub filename: String,
}

/// Response for an asset listing.
#[derive(Debug, Serialize)]
pub struct ListAssetsResponse {
    /// Every asset in the caller's namespace.
    pub assets: Vec<AssetSummary>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Reads the `file` part and stores it under its content key.
///
/// Reading stops as soon as the part exceeds the upload cap, so an
/// oversized file is never buffered in full nor sent to the store.
async fn upload_asset(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<AssetDescriptor>), ApiError> {
    let mut multipart = multipart
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?;
    let max = state.assets.settings().max_upload_bytes;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, max))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e, max))? {
            let size = u64::try_from(data.len() + chunk.len()).unwrap_or(u64::MAX);
            state.assets.check_size(size)?;
            data.extend_from_slice(&chunk);
        }

        let file = UploadFile {
            filename,
            content_type,
            data: data.freeze(),
        };
        let descriptor = state.assets.upload(&caller, file).await?;
        return Ok((StatusCode::CREATED, Json(descriptor)));
    }

    Err(ApiError::bad_request(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

/// Issues a presigned PUT URL for the given filename.
async fn presign_upload(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    body: Result<Json<PresignRequest>, JsonRejection>,
) -> Result<Json<PresignDescriptor>, ApiError> {
    let Json(request) =
        body.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;

    let descriptor = state.assets.presign(&caller, &request.filename).await?;
    Ok(Json(descriptor))
}

/// Lists every asset owned by the caller.
async fn list_assets(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<ListAssetsResponse>, ApiError> {
    let assets = state.assets.list(&caller).await?;
    Ok(Json(ListAssetsResponse { assets }))
}

/// Returns metadata of one asset.
async fn get_asset(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AssetMetadata>, ApiError> {
    let metadata = state.assets.get(&caller, &id).await?;
    Ok(Json(metadata))
}

/// Deletes one asset. Missing assets delete cleanly.
async fn delete_asset(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.assets.delete(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Maps a multipart read failure; hitting the body limit counts as oversize.
fn multipart_error(err: &MultipartError, max: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError(AppError::PayloadTooLarge {
            size: max.saturating_add(1),
            max,
        });
    }
    ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
}
