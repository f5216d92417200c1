//! Clusterdeck - operator console for virtualization clusters
//!
//! Polls the cluster management backend for full inventory snapshots,
//! maintains the operator's live view state on top of them, and serves
//! the console API.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use clusterdeck::config::LogFormat;
use clusterdeck::console::Console;
use clusterdeck::services::{HttpClusterClient, SnapshotFeed};
use clusterdeck::{api, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("Clusterdeck {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_logging(&config);

    info!("Clusterdeck starting up");
    info!("Cluster backend: {}", config.backend.url);
    info!("Active cluster: {}", config.backend.default_cluster);

    let cluster = Arc::new(
        HttpClusterClient::new(&config.backend)
            .context("Failed to initialize cluster backend client")?,
    );
    let console = Arc::new(RwLock::new(Console::new(
        config.backend.default_cluster.clone(),
    )));

    let feed = SnapshotFeed::new(
        console.clone(),
        cluster.clone(),
        Duration::from_secs(config.feed.poll_interval_secs),
    );
    let events = feed.events();
    tokio::spawn(feed.run());
    info!(
        "Snapshot feed started ({}s interval)",
        config.feed.poll_interval_secs
    );

    let state = AppState {
        config: config.clone(),
        console,
        cluster,
        events,
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server is ready to accept connections");
    axum::serve(listener, app.into_make_service())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: AppState) -> Router {
    // CORS is open; the console API carries no credentials of its own
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    api::routes().layer(cors).layer(trace_layer).with_state(state)
}

/// Initialize logging from the configuration
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn print_help() {
    println!("Clusterdeck {}", env!("CARGO_PKG_VERSION"));
    println!("Operator console for virtualization clusters");
    println!();
    println!("USAGE:");
    println!("    clusterdeck [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print this help message");
    println!("    -V, --version    Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    Configuration is read from config.yaml, config/config.yaml or");
    println!("    /etc/clusterdeck/config.yaml, overridable via CLUSTERDECK_CONFIG.");
    println!("    Key environment overrides: CLUSTERDECK_HOST, CLUSTERDECK_PORT,");
    println!("    CLUSTERDECK_BACKEND_URL, CLUSTERDECK_CLUSTER, RUST_LOG.");
}
