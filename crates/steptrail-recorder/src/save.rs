//! Save flow: validate, encrypt, persist, refresh once, upload images.

use std::sync::Arc;

use parking_lot::Mutex;
use steptrail_protocols::{
    CredentialStore, SaveImageRequest, SaveSessionRequest, Screenshot, SessionId,
    SessionTransport, TransportError,
};
use tracing::{error, info, warn};

use crate::envelope::KeyDerivation;
use crate::error::SaveError;
use crate::step::SessionEntry;

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub session_id: SessionId,
    pub session_name: String,
    pub images_uploaded: usize,
    pub images_failed: usize,
}

/// Saves sessions through a [`SessionTransport`].
pub struct SessionSaver {
    transport: Arc<dyn SessionTransport>,
    credentials: Arc<dyn CredentialStore>,
    keys: KeyDerivation,
    saved_names: Mutex<Vec<String>>,
}

impl SessionSaver {
    pub fn new(
        transport: Arc<dyn SessionTransport>,
        credentials: Arc<dyn CredentialStore>,
        keys: KeyDerivation,
    ) -> Self {
        Self {
            transport,
            credentials,
            keys,
            saved_names: Mutex::new(Vec::new()),
        }
    }

    /// Names saved successfully by this saver.
    pub fn saved_names(&self) -> Vec<String> {
        self.saved_names.lock().clone()
    }

    pub async fn save(
        &self,
        name: &str,
        entries: &[SessionEntry],
        screenshots: &[Screenshot],
    ) -> Result<SaveReport, SaveError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SaveError::NameRequired);
        }
        if self.saved_names.lock().iter().any(|saved| saved == name) {
            return Err(SaveError::DuplicateName(name.to_string()));
        }

        let credentials = self
            .credentials
            .load()
            .await
            .ok_or(SaveError::NotAuthenticated)?;
        let payload = serde_json::to_vec(entries)?;

        let mut access_token = credentials.access_token;
        let request = self.request(name, &payload, &access_token)?;
        let session_id = match self.transport.save_session(&access_token, &request).await {
            Ok(id) => id,
            Err(e) if e.is_unauthorized() => {
                warn!("Access token expired, refreshing");
                access_token = self.refresh(credentials.refresh_token.as_deref()).await?;
                let request = self.request(name, &payload, &access_token)?;
                self.transport
                    .save_session(&access_token, &request)
                    .await
                    .inspect_err(|e| error!("Saving session '{}' failed after refresh: {}", name, e))?
            }
            Err(e) => {
                error!("Saving session '{}' failed: {}", name, e);
                return Err(e.into());
            }
        };

        self.saved_names.lock().push(name.to_string());
        info!("Saved session '{}' as {}", name, session_id);

        let (images_uploaded, images_failed) =
            self.upload_images(&access_token, &session_id, screenshots).await;
        Ok(SaveReport {
            session_id,
            session_name: name.to_string(),
            images_uploaded,
            images_failed,
        })
    }

    /// The envelope is keyed from the credential that sends it.
    fn request(
        &self,
        name: &str,
        payload: &[u8],
        access_token: &str,
    ) -> Result<SaveSessionRequest, SaveError> {
        let data = self.keys.derive(access_token).seal(payload)?;
        Ok(SaveSessionRequest {
            session_name: name.to_string(),
            data,
        })
    }

    /// Exchange the refresh token once. Any failure forgets the credentials.
    async fn refresh(&self, refresh_token: Option<&str>) -> Result<String, SaveError> {
        let result = match refresh_token {
            Some(token) => self.transport.refresh(token).await,
            None => Err(TransportError::Unauthorized),
        };
        match result {
            Ok(access_token) => {
                self.credentials.store_access_token(&access_token).await;
                info!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                error!("Credential refresh failed: {}", e);
                self.credentials.clear().await;
                Err(SaveError::ReauthenticationRequired)
            }
        }
    }

    /// Upload each screenshot independently; returns (uploaded, failed).
    async fn upload_images(
        &self,
        access_token: &str,
        session_id: &SessionId,
        screenshots: &[Screenshot],
    ) -> (usize, usize) {
        let mut uploaded = 0;
        let mut failed = 0;
        for screenshot in screenshots {
            let request = SaveImageRequest {
                session_id: session_id.clone(),
                step_id: screenshot.step_id,
                x: screenshot.x,
                y: screenshot.y,
                img_binary: screenshot.img_binary.clone(),
            };
            match self.transport.save_image(access_token, &request).await {
                Ok(()) => uploaded += 1,
                Err(e) => {
                    warn!("Failed to save image for step {}: {}", screenshot.step_id, e);
                    failed += 1;
                }
            }
        }
        (uploaded, failed)
    }
}

#[cfg(test)]
#[path = "save_tests.rs"]
mod tests;
