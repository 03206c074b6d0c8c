//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Signing secret used when none is configured. Never valid in production.
pub const DEVELOPMENT_SECRET: &str = "development-secret-change-me";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerSettings,
    /// JWT configuration.
    #[serde(default)]
    pub jwt: JwtSettings,
    /// Object storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Requests allowed per client IP per minute. 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Reverse proxies in front of the server whose `X-Forwarded-For`
    /// entries are trusted. 0 keys clients by socket address only.
    #[serde(default)]
    pub trusted_proxies: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            rate_limit_per_minute: default_rate_limit(),
            trusted_proxies: 0,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

fn default_rate_limit() -> u32 {
    100
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret the bearer credentials are signed with.
    #[serde(default = "default_secret")]
    pub secret: String,
    /// Clock skew tolerated on `exp`/`nbf`, in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
}

fn default_secret() -> String {
    DEVELOPMENT_SECRET.to_string()
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            leeway_secs: 0,
        }
    }
}

impl JwtSettings {
    /// Whether the secret is still the development default.
    #[must_use]
    pub fn uses_development_secret(&self) -> bool {
        self.secret == DEVELOPMENT_SECRET
    }
}

/// Which object store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// S3-compatible store (Cloudflare R2, AWS S3, MinIO).
    #[default]
    S3,
    /// Local filesystem (development only, cannot presign).
    Fs,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Explicit S3 endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Cloudflare account ID, used to derive the R2 endpoint when no
    /// explicit endpoint is set.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: String,
    /// Region (R2 uses `auto`).
    #[serde(default = "default_region")]
    pub region: String,
    /// Root directory for the filesystem backend.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Public base URL that asset keys are appended to.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Validity of presigned upload URLs in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,
    /// Objects requested per listing page.
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_public_url() -> String {
    "https://cdn.example.com".to_string()
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

fn default_presign_ttl() -> u64 {
    900 // 15 minutes
}

fn default_list_page_size() -> usize {
    1000
}

impl StorageSettings {
    /// Resolves the S3 endpoint.
    ///
    /// An explicit endpoint wins; otherwise an account ID yields the
    /// Cloudflare R2 endpoint for that account.
    #[must_use]
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint.clone().or_else(|| {
            self.account_id
                .as_ref()
                .map(|account| format!("https://{account}.r2.cloudflarestorage.com"))
        })
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIAGATE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("MEDIAGATE__SERVER__PORT", Some("9090")),
                ("MEDIAGATE__JWT__SECRET", Some("s3cret")),
                ("MEDIAGATE__STORAGE__BUCKET", Some("media")),
                ("MEDIAGATE__STORAGE__ACCOUNT_ID", Some("acct")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.jwt.secret, "s3cret");
                assert!(!config.jwt.uses_development_secret());
                assert_eq!(config.storage.bucket, "media");
                assert_eq!(config.storage.backend, StorageBackend::S3);
                assert_eq!(
                    config.storage.resolved_endpoint().as_deref(),
                    Some("https://acct.r2.cloudflarestorage.com")
                );
            },
        );
    }

    #[test]
    fn test_storage_defaults() {
        temp_env::with_vars(
            [
                ("MEDIAGATE__STORAGE__BUCKET", Some("media")),
                ("MEDIAGATE__JWT__SECRET", None::<&str>),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.storage.max_upload_bytes, 100 * 1024 * 1024);
                assert_eq!(config.storage.presign_ttl_secs, 900);
                assert_eq!(config.storage.region, "auto");
                assert_eq!(config.storage.list_page_size, 1000);
                assert!(config.jwt.uses_development_secret());
                assert_eq!(config.server.request_timeout_secs, 60);
                assert_eq!(config.server.rate_limit_per_minute, 100);
                assert_eq!(config.server.trusted_proxies, 0);
            },
        );
    }

    #[test]
    fn test_rate_limit_from_environment() {
        temp_env::with_vars(
            [
                ("MEDIAGATE__STORAGE__BUCKET", Some("media")),
                ("MEDIAGATE__SERVER__RATE_LIMIT_PER_MINUTE", Some("0")),
                ("MEDIAGATE__SERVER__TRUSTED_PROXIES", Some("1")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.rate_limit_per_minute, 0);
                assert_eq!(config.server.trusted_proxies, 1);
            },
        );
    }

    #[test]
    fn test_explicit_endpoint_wins() {
        let settings = StorageSettings {
            backend: StorageBackend::S3,
            endpoint: Some("http://localhost:9000".to_string()),
            account_id: Some("acct".to_string()),
            bucket: "media".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: default_region(),
            root: default_root(),
            public_url: default_public_url(),
            max_upload_bytes: default_max_upload_bytes(),
            presign_ttl_secs: default_presign_ttl(),
            list_page_size: default_list_page_size(),
        };
        assert_eq!(
            settings.resolved_endpoint().as_deref(),
            Some("http://localhost:9000")
        );
    }
}
