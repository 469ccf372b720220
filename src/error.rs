use thiserror::Error;

use crate::conversation::Failure;

/// Everything that can go wrong while dispatching one turn
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("an API key is required in direct mode")]
    MissingCredential,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body is not JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("response held no assistant text: {0}")]
    NoContent(serde_json::Value),
}

impl ChatError {
    /// The user-facing failure class. Diagnostic payloads stay behind.
    pub fn failure(&self) -> Failure {
        match self {
            ChatError::MissingCredential => Failure::MissingCredential,
            ChatError::Transport(_) => Failure::Transport,
            ChatError::Status { status, .. } => Failure::Status(*status),
            ChatError::InvalidJson(_) => Failure::InvalidJson,
            ChatError::NoContent(_) => Failure::NoContent,
        }
    }
}
