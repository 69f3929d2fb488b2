//! Error type for the PurpleAir client.
//!
//! # Design
//! Every fallible operation in the crate returns `ApiError`, so callers catch
//! a single type at their boundary. The variants only exist to keep the
//! human-readable message precise; nothing in the crate retries or swallows
//! them.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised by request building, transport and response handling.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid arguments or client configuration, detected before any I/O.
    #[error("{0}")]
    Config(String),

    /// The server replied with a status code in neither the success nor the
    /// error set.
    #[error("Unknown status code - {0}!")]
    UnknownStatus(u16),

    /// The server replied with a status code from the error set.
    #[error("{status}: {}", describe_failure(.error, .description))]
    Status {
        status: u16,
        error: Option<String>,
        description: Option<String>,
    },

    /// The HTTP round-trip itself failed (DNS, connect, timeout, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Render the server-provided `error`/`description` pair, omitting whatever
/// the failure payload left out.
fn describe_failure(error: &Option<String>, description: &Option<String>) -> String {
    match (error.as_deref(), description.as_deref()) {
        (Some(error), Some(description)) => format!("{error} - {description}"),
        (Some(error), None) => error.to_string(),
        (None, Some(description)) => description.to_string(),
        (None, None) => "request failed without error details".to_string(),
    }
}
