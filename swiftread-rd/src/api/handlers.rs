//! HTTP request handlers
//!
//! Validation, import and fetch failures come back as 4xx/502 JSON bodies
//! and are also pushed onto the signal stream; persistence problems never
//! reach a client.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use swiftread_common::{text, Error, Signals};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::api::AppState;
use crate::import;
use crate::library::LibrarySummary;
use crate::playback::{ReaderCommand, SavedText, SessionSnapshot};

/// Characters of extracted text echoed back as an import preview
const PREVIEW_CHARS: usize = 200;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

impl StatusResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct WpmRequest {
    wpm: u32,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportUrlRequest {
    url: String,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    library: Vec<LibrarySummary>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    success: bool,
    title: String,
    total_words: usize,
    preview: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: Error) -> HandlerError {
    let status = match &err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Fetch(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Submit a command to the session task.
async fn dispatch(state: &AppState, cmd: ReaderCommand) -> Result<(), HandlerError> {
    state.commands.send(cmd).await.map_err(|_| {
        error!("session task unavailable");
        error_response(Error::Internal("session task unavailable".to_string()))
    })
}

/// Submit a command carrying a reply channel and await the answer.
async fn dispatch_query<T>(
    state: &AppState,
    cmd: ReaderCommand,
    rx: oneshot::Receiver<T>,
) -> Result<T, HandlerError> {
    dispatch(state, cmd).await?;
    rx.await
        .map_err(|_| error_response(Error::Internal("session task dropped reply".to_string())))
}

// ============================================================================
// Push Channel
// ============================================================================

/// GET /events - SSE stream of signal bundles
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    state.broadcaster.handle_sse_connection()
}

// ============================================================================
// Playback Control
// ============================================================================

/// POST /reader/start - Start or resume playback
pub async fn start(State(state): State<AppState>) -> Result<Json<StatusResponse>, HandlerError> {
    dispatch(&state, ReaderCommand::Start).await?;
    Ok(StatusResponse::ok())
}

/// POST /reader/pause - Pause and persist position
pub async fn pause(State(state): State<AppState>) -> Result<Json<StatusResponse>, HandlerError> {
    dispatch(&state, ReaderCommand::Pause).await?;
    Ok(StatusResponse::ok())
}

/// POST /reader/toggle - Keyboard pause shortcut
pub async fn toggle(State(state): State<AppState>) -> Result<Json<StatusResponse>, HandlerError> {
    dispatch(&state, ReaderCommand::Toggle).await?;
    Ok(StatusResponse::ok())
}

/// POST /reader/reset - Back to the beginning of the active text
pub async fn reset(State(state): State<AppState>) -> Result<Json<StatusResponse>, HandlerError> {
    dispatch(&state, ReaderCommand::Reset).await?;
    Ok(StatusResponse::ok())
}

/// POST /reader/faster - Increase reading speed one step
pub async fn faster(State(state): State<AppState>) -> Result<Json<StatusResponse>, HandlerError> {
    dispatch(&state, ReaderCommand::Faster).await?;
    Ok(StatusResponse::ok())
}

/// POST /reader/slower - Decrease reading speed one step
pub async fn slower(State(state): State<AppState>) -> Result<Json<StatusResponse>, HandlerError> {
    dispatch(&state, ReaderCommand::Slower).await?;
    Ok(StatusResponse::ok())
}

/// POST /reader/wpm - Set reading speed directly (clamped)
pub async fn set_wpm(
    State(state): State<AppState>,
    Json(req): Json<WpmRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    dispatch(&state, ReaderCommand::SetWpm(req.wpm)).await?;
    Ok(StatusResponse::ok())
}

/// GET /reader/status - Session snapshot
pub async fn status(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, HandlerError> {
    let (tx, rx) = oneshot::channel();
    let snapshot = dispatch_query(&state, ReaderCommand::Snapshot { reply: tx }, rx).await?;
    Ok(Json(snapshot))
}

// ============================================================================
// Library
// ============================================================================

/// GET /library - Entries sorted by case-insensitive title
pub async fn list_library(
    State(state): State<AppState>,
) -> Result<Json<LibraryResponse>, HandlerError> {
    let (tx, rx) = oneshot::channel();
    let library = dispatch_query(&state, ReaderCommand::List { reply: tx }, rx).await?;
    Ok(Json(LibraryResponse { library }))
}

/// POST /library/save - Persist the active or submitted text
pub async fn save_text(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SavedText>, HandlerError> {
    let (tx, rx) = oneshot::channel();
    let cmd = ReaderCommand::Save {
        title: req.title,
        text: req.text,
        reply: tx,
    };
    let saved = dispatch_query(&state, cmd, rx).await?.map_err(|err| {
        state
            .broadcaster
            .broadcast_lossy(Signals::new().set("error", err.to_string()));
        error_response(err)
    })?;
    Ok(Json(saved))
}

/// POST /library/load/:text_id - Make a library entry the active text
pub async fn load_text(
    State(state): State<AppState>,
    Path(text_id): Path<String>,
) -> Result<Json<SessionSnapshot>, HandlerError> {
    let (tx, rx) = oneshot::channel();
    let cmd = ReaderCommand::Load {
        text_id,
        reply: tx,
    };
    let snapshot = dispatch_query(&state, cmd, rx).await?.map_err(|err| {
        state
            .broadcaster
            .broadcast_lossy(Signals::new().set("error", err.to_string()));
        error_response(err)
    })?;
    Ok(Json(snapshot))
}

/// DELETE /library/:text_id - Remove an entry (no-op when absent)
pub async fn delete_text(
    State(state): State<AppState>,
    Path(text_id): Path<String>,
) -> Result<Json<LibraryResponse>, HandlerError> {
    let (tx, rx) = oneshot::channel();
    let cmd = ReaderCommand::Delete {
        text_id,
        reply: tx,
    };
    let library = dispatch_query(&state, cmd, rx).await?;
    Ok(Json(LibraryResponse { library }))
}

// ============================================================================
// Import Pipeline
// ============================================================================

/// POST /import/url - Fetch a web article into the session
pub async fn import_url(
    State(state): State<AppState>,
    Json(req): Json<ImportUrlRequest>,
) -> Result<Json<ImportResponse>, HandlerError> {
    let url = req.url.trim();
    let imported = import::article::import_url(url).await.map_err(|err| {
        info!("URL import failed: {}", err);
        state
            .broadcaster
            .broadcast_lossy(Signals::new().set("import_error", err.to_string()));
        error_response(err)
    })?;

    finish_import(&state, imported).await
}

/// POST /import/epub - Upload an EPUB archive into the session
pub async fn import_epub(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportResponse>, HandlerError> {
    let imported = import::epub::extract_epub(&body).map_err(|err| {
        info!("EPUB import failed: {}", err);
        state
            .broadcaster
            .broadcast_lossy(Signals::new().set("import_error", err.to_string()));
        error_response(err)
    })?;

    finish_import(&state, imported).await
}

async fn finish_import(
    state: &AppState,
    imported: import::ImportedText,
) -> Result<Json<ImportResponse>, HandlerError> {
    let preview = text::truncate_chars(&imported.words.join(" "), PREVIEW_CHARS);
    let (tx, rx) = oneshot::channel();
    let cmd = ReaderCommand::Import {
        imported,
        reply: tx,
    };
    let snapshot = dispatch_query(state, cmd, rx).await?;

    Ok(Json(ImportResponse {
        success: true,
        title: snapshot.title.unwrap_or_default(),
        total_words: snapshot.total_words,
        preview,
    }))
}
