use thiserror::Error;

/// Errors emitted by generation services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Raised when a repair request or provider configuration is unusable.
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure talking to the provider.
    #[error("generation request failed: {0}")]
    Transport(String),

    /// Provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Every configured key was rate limited.
    #[error("{0}")]
    RateLimited(String),

    /// Provider answered but the payload was unusable.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Scripted provider ran out of replies.
    #[error("no scripted reply left for request {0}")]
    Exhausted(usize),
}

impl GenerationError {
    /// Helper for wrapping request problems.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Helper for malformed responses.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Whether the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Transport(_) | GenerationError::RateLimited(_) => true,
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
