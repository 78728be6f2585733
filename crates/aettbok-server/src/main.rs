#![allow(clippy::doc_markdown)]
//! Aettbok Server - REST API for the Aettbok graph entity store.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use clap::Parser;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aettbok_core::{EntityStore, StoreConfig};
use aettbok_server::{build_router, AppState, API_KEY_ENV};

const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// Aettbok Server - genealogical records over a property graph
#[derive(Parser, Debug)]
#[command(name = "aettbok-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "AETTBOK_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "AETTBOK_PORT")]
    port: u16,

    /// Configuration file (defaults to ./aettbok.toml when present)
    #[arg(short, long, env = "AETTBOK_CONFIG")]
    config: Option<PathBuf>,

    /// Allowed CORS origins, comma separated. Permissive when unset.
    #[arg(long, env = "AETTBOK_CORS_ORIGIN", value_delimiter = ',')]
    cors_origin: Vec<String>,
}

/// CORS for the given origins; unparsable origins are dropped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        tracing::warn!("CORS: permissive (dev mode). Set AETTBOK_CORS_ORIGIN to restrict origins.");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .collect();
    tracing::info!(origins = allowed.len(), "CORS: restricted");
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, X_API_KEY])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!("Starting Aettbok server...");

    let config = StoreConfig::load(args.config.as_deref())?;
    tracing::info!(
        cache_enabled = config.cache.enabled,
        ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );
    let store = EntityStore::connect(&config).await?;

    let api_key = std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
    match api_key {
        Some(_) => tracing::info!("Authentication: enabled ({API_KEY_ENV} is set)"),
        None => tracing::warn!("Authentication: DISABLED (dev mode). Set {API_KEY_ENV} to enable."),
    }

    let state = Arc::new(AppState { store, api_key });

    let app = build_router(state)
        .layer(CompressionLayer::new())
        .layer(cors_layer(&args.cors_origin))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!("Aettbok server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
