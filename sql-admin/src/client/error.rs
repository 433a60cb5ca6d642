//! Client-side error taxonomy
//!
//! Every variant carries the operator-facing message verbatim; the
//! controller shows it on the status line and goes on.

use thiserror::Error;

/// Message used when an edit is attempted on a table without a single-column key
pub const UNSUPPORTED_KEY_SHAPE: &str =
    "unsupported key shape: editing requires a single-column PRIMARY KEY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request failed or came back with a non-success status
    #[error("{0}")]
    Transport(String),

    /// A local precondition was violated; no request was sent
    #[error("{0}")]
    Constraint(String),

    /// The backend answered with `ok: false` and a message
    #[error("{0}")]
    Rejected(String),
}

impl ClientError {
    pub fn unsupported_key_shape() -> Self {
        ClientError::Constraint(UNSUPPORTED_KEY_SHAPE.to_string())
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        match self {
            ClientError::Transport(message)
            | ClientError::Constraint(message)
            | ClientError::Rejected(message) => message,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Transport(error.to_string())
    }
}
