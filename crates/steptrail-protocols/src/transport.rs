//! Session persistence and credential collaborators.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Identifier assigned by the remote service to a saved session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of the session save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSessionRequest {
    pub session_name: String,
    /// Base64url envelope of the encrypted session JSON.
    pub data: String,
}

/// Body of a per-step image upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveImageRequest {
    pub session_id: SessionId,
    pub step_id: u64,
    pub x: f64,
    pub y: f64,
    pub img_binary: String,
}

/// Remote persistence of encrypted sessions.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Save the session record. Returns [`TransportError::Unauthorized`] on an
    /// expired credential.
    async fn save_session(
        &self,
        access_token: &str,
        request: &SaveSessionRequest,
    ) -> Result<SessionId, TransportError>;

    /// Upload one step image bound to a saved session.
    async fn save_image(
        &self,
        access_token: &str,
        request: &SaveImageRequest,
    ) -> Result<(), TransportError>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String, TransportError>;
}

/// Access/refresh credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

/// Storage for the current credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Option<Credentials>;

    /// Replace the access token after a successful refresh.
    async fn store_access_token(&self, access_token: &str);

    /// Forget everything; forces re-authentication.
    async fn clear(&self);
}
