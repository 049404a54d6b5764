//! Error Types
//!
//! One error enum for the whole crate. Malformed stream lines are not
//! represented here: they are skipped during parsing, never surfaced.

use thiserror::Error;

/// Main error type for yapper operations
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration errors (invalid JSON, unreadable file, bad URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model key not present in the server's catalog
    #[error("Model '{0}' not found in the server catalog")]
    ModelNotFound(String),

    /// The request could not be made (connect failure, timeout, ...)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status before streaming began
    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The reply byte stream could not be decoded
    #[error("Failed to decode reply stream: {0}")]
    Decode(String),

    /// A non-streaming response body did not parse as expected
    #[error("Response error: {0}")]
    Response(String),

    /// Local session store errors
    #[error("Session store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ChatError::Transport(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ChatError::Response(format!("Failed to decode response: {}", err))
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Response(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::Store(format!("IO error: {}", err))
    }
}

/// Result type alias for yapper operations
pub type Result<T> = std::result::Result<T, ChatError>;
