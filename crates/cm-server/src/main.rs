//! CarMart RS Server
//!
//! HTTP server binary wiring the listing lifecycle, attachment ingestion,
//! and identity verification together.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cm_api::AppState;
use cm_attachments::{AttachmentIngestor, LocalStorage};
use cm_auth::JwtService;
use cm_core::AppConfig;
use cm_listings::{ListingService, MemoryListingStore};

mod health;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        AppConfig::default()
    });

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting CarMart RS"
    );

    // The upload sink is a process-wide resource, created once and injected.
    tokio::fs::create_dir_all(&config.storage.local_path).await?;
    let storage = Arc::new(LocalStorage::new(
        &config.storage.local_path,
        &config.storage.base_url,
    ));
    info!(path = %config.storage.local_path, "Attachment storage ready");

    let state = build_state(config.clone(), storage);
    let app = build_router(state);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cm_server=debug,cm_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Wire the shared application state
fn build_state(config: AppConfig, storage: Arc<LocalStorage>) -> AppState {
    let ingestor = AttachmentIngestor::new(storage)
        .with_max_file_size(config.storage.max_attachment_size);
    let listings = ListingService::new(Arc::new(MemoryListingStore::new()));
    let jwt = JwtService::new(config.auth.jwt_secret.as_bytes());

    AppState::new(
        Arc::new(config),
        Arc::new(listings),
        Arc::new(ingestor),
        Arc::new(jwt),
    )
}

/// Build the application router
fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_size_bytes;

    let health_routes = Router::new().route("/health", get(health::health));

    Router::new()
        .merge(health_routes)
        .merge(cm_api::router().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .layer(DefaultBodyLimit::max(max_body))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
