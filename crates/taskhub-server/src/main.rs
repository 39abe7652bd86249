//! Taskhub Server
//!
//! A minimal task-tracking backend: CRUD over a single tasks table, with
//! real-time fan-out of change events to connected WebSocket clients.
//!
//! Uses SQLite (embedded) instead of an external RDBMS for simplicity.

mod error;
mod handlers;
mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use handlers::ws::EventHub;
use storage::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub hub: Arc<EventHub>,
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Taskhub Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    // Load configuration
    let config = load_config().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address, config.database_path
    );

    // Initialize SQLite database
    let db = Arc::new(
        Database::new(&config.database_path)
            .await
            .context("Failed to initialize database")?,
    );
    info!("SQLite database initialized at: {}", config.database_path);

    // The hub is constructed before the router and handed to the handler
    // layer through state, so there is no late-injection ordering hazard.
    let hub = Arc::new(EventHub::new());

    let state = AppState { db, hub };

    let cors = cors_layer(config.allowed_origin.as_deref())?;
    let app = build_router(state, cors);

    // Start server
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server ready to accept connections");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build the application router with all routes
fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // WebSocket endpoint for task change events
        .route("/ws", get(handlers::ws::handler))
        // REST API routes
        .nest("/api", api_routes())
        // Layers
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks",
            get(handlers::tasks::list).post(handlers::tasks::create),
        )
        .route(
            "/tasks/:id",
            get(handlers::tasks::get)
                .put(handlers::tasks::update)
                .delete(handlers::tasks::delete),
        )
}

/// CORS policy: locked to one origin when ALLOWED_ORIGIN is set,
/// permissive otherwise.
fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let cors = match allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .context("Invalid ALLOWED_ORIGIN")?,
            )
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };
    Ok(cors)
}

#[derive(Debug, Clone)]
struct Config {
    bind_address: String,
    database_path: String,
    allowed_origin: Option<String>,
}

fn load_config() -> Result<Config> {
    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/taskhub.db".to_string());

    let allowed_origin = std::env::var("ALLOWED_ORIGIN").ok();
    if allowed_origin.is_none() {
        warn!("ALLOWED_ORIGIN not set, allowing all origins");
    }

    Ok(Config {
        bind_address,
        database_path,
        allowed_origin,
    })
}
