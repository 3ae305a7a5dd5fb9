//! Atlas Server
//!
//! HTTP service that mirrors country/currency reference data from two
//! public upstream APIs into an embedded SQLite store, and serves
//! query, delete, and summary-image endpoints from the mirror.

mod fetch;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use atlas_core::CountryStore;
use fetch::UpstreamClient;
use services::{Reconciler, SummaryRenderer, UniformMultiplier};
use storage::Database;

const DEFAULT_COUNTRIES_API: &str = "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
const DEFAULT_EXCHANGE_API: &str = "https://open.er-api.com/v6/latest/USD";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CountryStore>,
    pub upstream: Arc<UpstreamClient>,
    pub reconciler: Arc<Reconciler>,
    pub image_path: PathBuf,
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
    }));

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Atlas Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    // Load configuration
    let config = load_config()
        .await
        .context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address, config.database_path
    );

    // Open the SQLite store (pool + inline migrations)
    let store: Arc<dyn CountryStore> = Arc::new(
        Database::new(&config.database_path)
            .await
            .context("Failed to initialize database")?,
    );

    // Wire services: renderer runs as the post-refresh hook
    let image_path = config.cache_dir.join("summary.png");
    let renderer = Arc::new(SummaryRenderer::new(store.clone(), image_path.clone()));
    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        Arc::new(UniformMultiplier),
        renderer,
    ));
    let upstream = Arc::new(
        UpstreamClient::new(config.countries_api.clone(), config.exchange_api.clone())
            .context("Failed to build upstream client")?,
    );
    info!("Services initialized");

    let state = AppState {
        store: store.clone(),
        upstream,
        reconciler,
        image_path,
    };

    let app = router(state);

    // Start server
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    store.close().await;

    Ok(())
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::meta::home))
        .route("/init-db", get(handlers::meta::init_db))
        .route("/status", get(handlers::meta::status))
        .route("/countries", get(handlers::countries::list))
        .route("/countries/refresh", post(handlers::countries::refresh))
        .route("/countries/image", get(handlers::countries::image))
        .route(
            "/countries/:name",
            get(handlers::countries::get_one).delete(handlers::countries::delete),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Clone)]
struct Config {
    bind_address: String,
    database_path: String,
    cache_dir: PathBuf,
    countries_api: String,
    exchange_api: String,
}

async fn load_config() -> Result<Config> {
    info!("Loading configuration from environment...");

    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
        let path = data_dir.join("atlas.db");
        path.to_string_lossy().to_string()
    });

    let cache_dir = std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join("cache"));

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let countries_api =
        std::env::var("COUNTRIES_API").unwrap_or_else(|_| DEFAULT_COUNTRIES_API.to_string());
    let exchange_api =
        std::env::var("EXCHANGE_API").unwrap_or_else(|_| DEFAULT_EXCHANGE_API.to_string());

    Ok(Config {
        bind_address,
        database_path,
        cache_dir,
        countries_api,
        exchange_api,
    })
}
