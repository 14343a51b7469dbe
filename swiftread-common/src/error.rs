//! Common error types for SwiftRead

use thiserror::Error;

/// Common result type for SwiftRead operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the reader service.
///
/// None of these terminate the process: validation, import and fetch
/// failures are reported back to the client, persistence failures are
/// logged and degrade to in-memory operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input (invalid URL, title/text too short)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Import pipeline failure (unreadable archive, insufficient text)
    #[error("Import failed: {0}")]
    Import(String),

    /// Network fetch failure (timeout, non-2xx status)
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Library file load/save failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
