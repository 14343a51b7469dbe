//! REST API for the reader service
//!
//! Control endpoints submit commands to the session task; clients receive
//! playback signals over the SSE endpoint.

pub mod handlers;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::playback::ReaderCommand;
use crate::sse::SignalBroadcaster;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Command queue into the session task
    pub commands: mpsc::Sender<ReaderCommand>,
    /// Push channel to connected clients
    pub broadcaster: SignalBroadcaster,
    /// Resolved library file path (diagnostics only)
    pub library_file: String,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                // Push channel
                .route("/events", get(handlers::events))
                // Playback control
                .route("/reader/start", post(handlers::start))
                .route("/reader/pause", post(handlers::pause))
                .route("/reader/toggle", post(handlers::toggle))
                .route("/reader/reset", post(handlers::reset))
                .route("/reader/faster", post(handlers::faster))
                .route("/reader/slower", post(handlers::slower))
                .route("/reader/wpm", post(handlers::set_wpm))
                .route("/reader/status", get(handlers::status))
                // Library
                .route("/library", get(handlers::list_library))
                .route("/library/save", post(handlers::save_text))
                .route("/library/load/:text_id", post(handlers::load_text))
                .route("/library/:text_id", delete(handlers::delete_text))
                // Import pipeline
                .route("/import/url", post(handlers::import_url))
                .route("/import/epub", post(handlers::import_epub)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "swiftread-rd",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "library_file": state.library_file,
    }))
}
