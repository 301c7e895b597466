//! Screenshot capture collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// Opaque image payload bound to one session step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub step_id: u64,
    pub x: f64,
    pub y: f64,
    /// Encoded image, typically a `data:image/png;base64,...` URL.
    pub img_binary: String,
}

/// Captures the visible page for a step.
#[async_trait]
pub trait ScreenshotCapturer: Send + Sync {
    async fn capture(&self, step_id: u64, x: f64, y: f64) -> Result<Screenshot, CaptureError>;
}
