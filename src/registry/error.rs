//! Registry call failures

use std::fmt;

/// Why a registry call produced no usable payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The server answered with a non-success status. The body is kept
    /// because the registry renders its own error markup.
    Status { status: u16, body: String },
    /// Connection, TLS or timeout failure
    Transport(String),
    /// Response body could not be read or decoded
    Body(String),
}

impl RegistryError {
    /// Markup the server sent along with the failure, if any
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => Some(body),
            _ => None,
        }
    }

    /// Transport-level failures are worth retrying; a server verdict is not,
    /// except for 5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Transport(_) => true,
            Self::Body(_) => false,
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, .. } => write!(f, "Registry returned HTTP {}", status),
            Self::Transport(msg) => write!(f, "Network error: {}", msg),
            Self::Body(msg) => write!(f, "Unreadable response: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() || e.is_body() {
            Self::Body(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
