use thiserror::Error;

/// Error types that can occur when talking to a chat backend.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Invalid input or a rejected operation (empty message, busy session)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Errors reported by the chat backend itself
    #[error("Provider error: {0}")]
    ProviderError(String),
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// Local persistence read/write errors
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Generic error
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Converts reqwest HTTP errors into ChatErrors
impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
