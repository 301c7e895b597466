//! Report sink trait.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::{InteractionReport, ReportStatus};

/// Receiving end of the observer-to-recorder boundary.
///
/// Implementations must tolerate the same logical event arriving several
/// times (critical-path attempts) and reports from pages that have already
/// navigated away.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: InteractionReport) -> Result<ReportStatus, DeliveryError>;
}
