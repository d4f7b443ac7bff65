use thiserror::Error;

/// Errors produced while reading or writing notebook documents.
#[derive(Debug, Error)]
pub enum IpynbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid notebook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported nbformat version: {0} (only nbformat 4 is supported)")]
    UnsupportedFormat(u64),
}
