//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use axum::{
    Router, http,
    http::{Method, header},
};
use platform::kv::MemoryKeyValueStore;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use thought::{OpenAiGateway, PgKeyValueStore, thought_router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,thought=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ServerConfig::from_env()?;
    let thought_config = settings.thought.clone();

    let gateway = thought_config
        .remote_settings()
        .map(OpenAiGateway::new)
        .transpose()?;

    tracing::info!(
        remote_enabled = gateway.is_some(),
        force_local = thought_config.force_local,
        local_max = thought_config.local_rate_limit.max_requests,
        remote_max = thought_config.remote_rate_limit.max_requests,
        "Thought generation configured"
    );

    let thoughts = match settings.database_url.as_deref() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let store = PgKeyValueStore::new(pool);

            // Startup cleanup: windows older than the longest window are dead
            // Errors here should not prevent server startup
            let longest_window = thought_config
                .remote_rate_limit
                .window
                .max(thought_config.local_rate_limit.window);
            let cutoff = chrono::Utc::now() - chrono::Duration::from_std(longest_window)?;
            if let Err(e) = store.cleanup_stale_windows(cutoff).await {
                tracing::warn!(
                    error = %e,
                    "Rate window cleanup failed, continuing anyway"
                );
            }

            thought_router(store, gateway, thought_config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, rate windows and caches are in-memory only");
            thought_router(MemoryKeyValueStore::new(), gateway, thought_config)
        }
    };

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = settings
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            http::HeaderName::from_static(thought::presentation::handlers::ADMIN_TOKEN_HEADER),
        ]))
        .expose_headers([header::RETRY_AFTER]);

    // Build router
    let app = Router::new()
        .nest("/api/thoughts", thoughts)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
