use thiserror::Error;

/// Error taxonomy shared by every layer.
///
/// Per-item create/delete failures during reconciliation are not represented
/// here; they are collected into the reconcile result and reported.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication failure: {0}")]
    Authentication(String),
    #[error("calendar unavailable: {0}")]
    CalendarUnavailable(String),
    #[error("invalid session: {0}")]
    InvalidSession(String),
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),
    #[error("credential store error: {0}")]
    Credential(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
