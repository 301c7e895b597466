//! Remote transport errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The credential was rejected as expired or invalid (HTTP 401 or equivalent).
    #[error("Unauthorized: credential expired or invalid")]
    Unauthorized,

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Whether a credential refresh could fix this error.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::Unauthorized)
    }
}
