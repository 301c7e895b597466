//! HTTP implementation of [`SessionTransport`].

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use steptrail_config::TransportConfig;
use steptrail_protocols::{
    SaveImageRequest, SaveSessionRequest, SessionId, SessionTransport, TransportError,
};
use tracing::debug;

const TOKEN_EXPIRED: &str = "Token has expired";

/// Talks to the remote session service with bearer authentication.
pub struct HttpSessionTransport {
    client: Client,
    config: TransportConfig,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSessionId {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
struct SaveSessionResponse {
    session_id: RawSessionId,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    device_type: &'a str,
}

impl HttpSessionTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST `body` with a bearer token; returns the status and raw body.
    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        bearer: &str,
        body: &T,
    ) -> Result<(StatusCode, String), TransportError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok((status, text))
    }
}

/// Map a response to an error unless it succeeded.
fn check(status: StatusCode, body: &str) -> Result<(), TransportError> {
    if status == StatusCode::UNAUTHORIZED || message_field(body, "msg").as_deref() == Some(TOKEN_EXPIRED) {
        return Err(TransportError::Unauthorized);
    }
    if !status.is_success() {
        let message = message_field(body, "error").unwrap_or_else(|| body.to_string());
        return Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(())
}

fn message_field(body: &str, field: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get(field)?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl SessionTransport for HttpSessionTransport {
    async fn save_session(
        &self,
        access_token: &str,
        request: &SaveSessionRequest,
    ) -> Result<SessionId, TransportError> {
        let (status, body) = self.post(&self.config.save_path, access_token, request).await?;
        check(status, &body)?;

        let parsed: SaveSessionResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        Ok(match parsed.session_id {
            RawSessionId::Text(id) => SessionId(id),
            RawSessionId::Number(id) => SessionId(id.to_string()),
        })
    }

    async fn save_image(
        &self,
        access_token: &str,
        request: &SaveImageRequest,
    ) -> Result<(), TransportError> {
        let (status, body) = self.post(&self.config.image_path, access_token, request).await?;
        check(status, &body)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, TransportError> {
        let request = RefreshRequest {
            device_type: &self.config.device_type,
        };
        let (status, body) = self
            .post(&self.config.refresh_path, refresh_token, &request)
            .await?;
        check(status, &body)?;

        let parsed: RefreshResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        Ok(parsed.access_token)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
