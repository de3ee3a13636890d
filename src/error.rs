//! Errors raised while decoding inbound score messages

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    /// Blank line or empty argument
    #[error("empty message")]
    Empty,

    /// Not JSON, or JSON of the wrong shape
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed, but tagged with a type this program does not handle
    #[error("unrecognized message type: {0}")]
    UnknownType(String),

    /// Sender did not match the configured origin
    #[error("message from untrusted origin: {}", .0.as_deref().unwrap_or("<none>"))]
    UntrustedOrigin(Option<String>),
}
