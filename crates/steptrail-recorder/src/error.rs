//! Recorder error types.

use steptrail_protocols::TransportError;
use thiserror::Error;

/// Failure to seal or open a session envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    #[error("Unsupported envelope version: {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("Envelope authentication failed")]
    AuthenticationFailed,

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Invalid envelope encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Failure of the save flow.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Session name is required")]
    NameRequired,

    #[error("A session named '{0}' already exists locally")]
    DuplicateName(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Credentials could not be refreshed, sign in again")]
    ReauthenticationRequired,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_version_hex() {
        let err = EnvelopeError::UnsupportedVersion(0x7f);
        assert!(err.to_string().contains("0x7f"));
    }

    #[test]
    fn test_authentication_failed() {
        let err = EnvelopeError::AuthenticationFailed;
        assert!(err.to_string().contains("authentication failed"));
    }

    #[test]
    fn test_duplicate_name() {
        let err = SaveError::DuplicateName("checkout".to_string());
        assert!(err.to_string().contains("'checkout'"));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_transport_error_from() {
        let err = SaveError::from(TransportError::Unauthorized);
        assert!(err.to_string().contains("Transport error"));
        assert!(matches!(err, SaveError::Transport(e) if e.is_unauthorized()));
    }

    #[test]
    fn test_envelope_error_from() {
        let err = SaveError::from(EnvelopeError::Malformed("too short".to_string()));
        assert!(err.to_string().contains("Envelope error"));
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_reauthentication_required() {
        let err = SaveError::ReauthenticationRequired;
        assert!(err.to_string().contains("sign in again"));
    }
}
