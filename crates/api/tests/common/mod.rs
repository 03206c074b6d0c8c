//! Shared harness for HTTP tests: an in-memory object store that records
//! every call, and helpers to mint credentials and drive the router.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header::AUTHORIZATION},
    response::Response,
};
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use mediagate_api::{AppState, create_router};
use mediagate_core::assets::{AssetService, AssetSettings};
use mediagate_core::storage::{ObjectMeta, ObjectPage, ObjectStore, StorageError};
use mediagate_shared::config::ServerSettings;
use mediagate_shared::{JwtConfig, JwtService};

pub const SECRET: &str = "integration-test-secret";
pub const PUBLIC_URL: &str = "https://cdn.example.com";
pub const MAX_UPLOAD: u64 = 1024;
pub const BOUNDARY: &str = "mediagate-test-boundary";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

/// In-memory store with small pages and a call counter.
#[derive(Default)]
pub struct RecordingStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    calls: AtomicUsize,
    fail: AtomicBool,
    page_size: usize,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            page_size: 2,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn insert(&self, key: &str, body: &'static [u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body: Bytes::from_static(body),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn record(&self) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::operation("backend unreachable: 10.0.0.7:9000"));
        }
        Ok(())
    }

    fn meta(key: &str, object: &StoredObject) -> ObjectMeta {
        ObjectMeta {
            key: key.to_string(),
            size: object.body.len() as u64,
            content_type: Some(object.content_type.clone()),
            last_modified: Some(Utc::now()),
        }
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.record()?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError> {
        self.record()?;
        let objects = self.objects.lock().unwrap();
        objects
            .get(key)
            .map(|o| Self::meta(key, o))
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn list_page(
        &self,
        prefix: &str,
        start_after: Option<String>,
    ) -> Result<ObjectPage, StorageError> {
        self.record()?;
        let objects = self.objects.lock().unwrap();
        let page: Vec<ObjectMeta> = objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| start_after.as_ref().is_none_or(|after| k.as_str() > after.as_str()))
            .take(self.page_size)
            .map(|(k, o)| Self::meta(k, o))
            .collect();

        let next_start_after = if page.len() == self.page_size {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };
        Ok(ObjectPage {
            objects: page,
            next_start_after,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.record()?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_put(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.record()?;
        Ok(format!(
            "https://store.example.com/{key}?X-Amz-Expires={}&X-Amz-Signature=test",
            ttl.as_secs()
        ))
    }
}

pub fn app(store: Arc<RecordingStore>) -> Router {
    app_with_server(store, &ServerSettings::default())
}

pub fn app_with_server(store: Arc<RecordingStore>, server: &ServerSettings) -> Router {
    let jwt_service = JwtService::new(&JwtConfig {
        secret: SECRET.to_string(),
        leeway_secs: 0,
    });
    let settings = AssetSettings::new(PUBLIC_URL).with_max_upload_bytes(MAX_UPLOAD);
    let state = AppState {
        jwt_service: Arc::new(jwt_service),
        assets: Arc::new(AssetService::new(store, settings)),
    };
    create_router(state, server)
}

pub fn token_for(sub: &str) -> String {
    let claims = json!({
        "sub": sub,
        "exp": Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(sub: &str) -> String {
    format!("Bearer {}", token_for(sub))
}

pub fn multipart_body(field: &str, filename: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(auth: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/media/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(app, request).await;
    let status = response.status();
    (status, body_json(response).await)
}
