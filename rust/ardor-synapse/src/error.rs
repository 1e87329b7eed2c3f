use thiserror::Error;

/// The common error type used by this crate
///
/// Only installation and encoding boundaries are fallible. Once the bridge
/// is running, every path is best-effort and failures are logged instead of
/// surfaced to the page.
#[derive(Error, Debug)]
pub enum SynapseError {
    /// The configuration handed to `init` could not be understood
    #[error("Invalid bridge configuration: {0}")]
    InvalidConfig(String),

    /// An outbound message could not be encoded for the wire
    #[error("Failed to encode a bridge message: {0}")]
    Encode(String),

    /// A browser API needed to install the bridge was missing or failed
    #[error("Host environment error: {0}")]
    Host(String),
}

impl From<serde_json::Error> for SynapseError {
    fn from(error: serde_json::Error) -> Self {
        SynapseError::Encode(format!("{error}"))
    }
}
