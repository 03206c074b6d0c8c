//! Mediagate API Server
//!
//! Main entry point for the media ingestion gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mediagate_api::{AppState, create_router};
use mediagate_core::assets::{AssetService, AssetSettings};
use mediagate_core::storage::{StorageConfig, StorageProvider, StorageService};
use mediagate_shared::config::{StorageBackend, StorageSettings};
use mediagate_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;

    if config.jwt.uses_development_secret() {
        warn!("Using the development signing secret; set MEDIAGATE__JWT__SECRET in production");
    }
    let jwt_service = JwtService::new(&JwtConfig {
        secret: config.jwt.secret.clone(),
        leeway_secs: config.jwt.leeway_secs,
    });

    let storage = StorageService::from_config(storage_config(&config.storage))
        .context("Failed to initialize object storage")?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        "Object storage configured"
    );

    let settings = AssetSettings::new(config.storage.public_url.clone())
        .with_max_upload_bytes(config.storage.max_upload_bytes)
        .with_presign_ttl(Duration::from_secs(config.storage.presign_ttl_secs));

    let state = AppState {
        jwt_service: Arc::new(jwt_service),
        assets: Arc::new(AssetService::new(Arc::new(storage), settings)),
    };

    let app = create_router(state, &config.server);
    if config.server.rate_limit_per_minute == 0 {
        warn!("Per-client rate limiting is disabled");
    } else {
        info!(
            per_minute = config.server.rate_limit_per_minute,
            trusted_proxies = config.server.trusted_proxies,
            "Per-client rate limiting enabled"
        );
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// Pretty output in development, JSON lines everywhere else.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mediagate=debug,tower_http=debug".into());
    let development =
        std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()) == "development";

    let registry = tracing_subscriber::registry().with(filter);
    if development {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    }
}

fn storage_config(settings: &StorageSettings) -> StorageConfig {
    let provider = match settings.backend {
        StorageBackend::S3 => StorageProvider::s3(
            settings.resolved_endpoint(),
            settings.bucket.clone(),
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            settings.region.clone(),
        ),
        StorageBackend::Fs => StorageProvider::local_fs(settings.root.clone()),
    };
    StorageConfig::new(provider).with_list_page_size(settings.list_page_size)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
