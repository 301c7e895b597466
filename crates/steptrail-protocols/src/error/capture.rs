//! Screenshot capture errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screenshot capture unavailable: {0}")]
    Unavailable(String),

    #[error("Screenshot capture failed: {0}")]
    Failed(String),

    #[error("No image returned for step {0}")]
    Empty(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_unavailable() {
        let err = CaptureError::Unavailable("no visible tab".to_string());
        assert!(err.to_string().contains("unavailable"));
        assert!(err.to_string().contains("no visible tab"));
    }

    #[test]
    fn test_capture_error_failed() {
        let err = CaptureError::Failed("permission denied".to_string());
        assert!(err.to_string().contains("failed"));
    }

    #[test]
    fn test_capture_error_empty() {
        let err = CaptureError::Empty(7);
        assert!(err.to_string().contains("step 7"));
    }
}
