//! Report delivery errors.

use thiserror::Error;

/// Failure to hand an interaction report to the recorder.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The receiving side has been dropped.
    #[error("Report channel closed")]
    Closed,

    /// The observing context was torn down before the send completed.
    #[error("Observing context is gone")]
    ContextGone,

    #[error("Delivery failed: {0}")]
    Failed(String),
}
