//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    /// A style or annotation command needs a selection and none is usable.
    /// The tree is left untouched.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument for {command}: {message}")]
    InvalidArgument { command: String, message: String },

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Not available in {0} mode")]
    WrongMode(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl EditorError {
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        EditorError::InvalidSelection(message.into())
    }

    pub fn invalid_argument(command: &str, message: impl Into<String>) -> Self {
        EditorError::InvalidArgument {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

/// Failure of a save call. The live buffer is never touched; the message
/// ends up in `SaveState::last_error`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Failure of a remote suggestion or content-analysis call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SuggestionServiceError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("No response within {0} ms")]
    Timeout(u64),
}
