use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggerError {
    /// A level name that is not one of `DEBUG`, `INFO`, `WARN` or `ERROR`
    #[error("Unknown log level: {0}")]
    InvalidLevel(String),

    /// A batch could not be encoded as JSON
    #[error("Failed to encode a log batch: {0}")]
    Encode(String),

    /// The request never produced a response
    #[error("Failed to reach the logs API: {0}")]
    Transport(String),

    /// The logs API kept rate limiting after every retry
    #[error("Rate limited by the logs API")]
    RateLimited,

    /// The logs API answered with a status other than 204 or 429
    #[error("Logs API rejected the batch with status {0}")]
    Rejected(u16),
}

impl From<serde_json::Error> for LoggerError {
    fn from(error: serde_json::Error) -> Self {
        LoggerError::Encode(format!("{error}"))
    }
}
