//! Error types for the conversation core.
//!
//! None of these reach the caller of a turn: the controller converts them
//! into a fallback message or a silent state reset. They exist so the
//! collaborators (backend, voice platform, storage) can report what went wrong
//! to the log.

use contoso_core::error::ContosoError;

/// Errors from the chat engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("backend request failed: {0}")]
    Transport(String),
    #[error("backend returned HTTP {status}: {body}")]
    BackendStatus { status: u16, body: String },
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("voice error: {0}")]
    VoiceError(String),
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<ContosoError> for ChatError {
    fn from(err: ContosoError) -> Self {
        match err {
            ContosoError::Config(msg) => ChatError::Configuration(msg),
            other => ChatError::StorageError(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::InvalidResponse(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
