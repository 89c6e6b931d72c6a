use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::{DatabaseManager, ItemStore, MemoryItemStore, PgItemStore};
use crate::handlers::{health, items};
use crate::media::{CloudinaryMediaStore, MediaStore, MemoryMediaStore};
use crate::middleware::require_principal;
use crate::state::AppState;

/// Full HTTP surface for the given state
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(item_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn item_routes(state: AppState) -> Router<AppState> {
    // Reads are public by policy
    let public = Router::new()
        .route("/api/items", get(items::list))
        .route("/api/items/:id", get(items::show));

    // Writes run behind the gate; route_layer keeps it off the public routes
    let protected = Router::new()
        .route("/api/items", post(items::create))
        .route("/api/items/:id", put(items::update).delete(items::delete))
        .route_layer(middleware::from_fn_with_state(state, require_principal));

    public.merge(protected)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Validate the configuration and pick the store and media backends.
///
/// Outside production, missing Postgres or Cloudinary settings fall back to
/// in-memory backends.
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    config.validate().context("invalid configuration")?;

    let store: Arc<dyn ItemStore> = match config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to the database")?;
            let store = PgItemStore::new(pool);
            store.migrate().await.context("failed to prepare lost_items table")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; items are kept in memory and lost on restart");
            Arc::new(MemoryItemStore::new())
        }
    };

    let media: Arc<dyn MediaStore> = match config.media.cloudinary.clone() {
        Some(cloudinary) => Arc::new(CloudinaryMediaStore::new(cloudinary, config.media.folder.clone())),
        None => {
            tracing::warn!("Cloudinary credentials not set; photos are kept in memory");
            Arc::new(MemoryMediaStore::new(config.media.folder.clone()))
        }
    };

    Ok(AppState::new(config, store, media))
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Lost & Found API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
