//! Reader service (swiftread-rd) - Main entry point
//!
//! Starts the session scheduler task, loads the text library and serves
//! the HTTP/SSE control surface.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swiftread_rd::api;
use swiftread_rd::config;
use swiftread_rd::library::LibraryStore;
use swiftread_rd::playback::SessionTask;
use swiftread_rd::sse::SignalBroadcaster;

/// Signal bundles buffered per client before a slow reader lags
const BROADCAST_CAPACITY: usize = 100;

/// Command-line arguments for swiftread-rd
#[derive(Parser, Debug)]
#[command(name = "swiftread-rd")]
#[command(about = "Speed-reading playback service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5810", env = "SWIFTREAD_PORT")]
    port: u16,

    /// Path of the persisted library file
    #[arg(short, long)]
    library_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swiftread_rd=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let library_file = config::resolve_library_file(args.library_file.as_deref());
    config::ensure_parent_dir(&library_file);

    info!("Starting SwiftRead reader service on port {}", args.port);
    info!("Library file: {}", library_file.display());

    let store = LibraryStore::load(&library_file);
    info!("Library loaded with {} entries", store.len());

    let broadcaster = SignalBroadcaster::new(BROADCAST_CAPACITY);
    let commands = SessionTask::spawn(store, broadcaster.clone());

    let app_state = api::AppState {
        commands,
        broadcaster,
        library_file: library_file.to_string_lossy().to_string(),
        port: args.port,
    };
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
