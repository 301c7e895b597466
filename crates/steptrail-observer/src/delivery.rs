//! Report delivery: standard single send and critical multi-attempt send.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use steptrail_protocols::{DeliveryError, InteractionReport, ReportSink, ReportStatus};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Sends reports to a [`ReportSink`] without blocking the caller.
#[derive(Clone)]
pub struct Dispatcher {
    sink: Arc<dyn ReportSink>,
    delays: Arc<[Duration]>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn ReportSink>, delays: Vec<Duration>) -> Self {
        Self {
            sink,
            delays: delays.into(),
        }
    }

    /// Number of attempts a critical send makes.
    pub fn attempts(&self) -> usize {
        self.delays.len()
    }

    /// Single fire-and-forget delivery.
    pub fn send_standard(&self, report: InteractionReport) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let kind = report.content;
            match sink.deliver(report).await {
                Ok(status) => debug!("Delivered {} report: {:?}", kind, status),
                Err(e) => warn!("Failed to deliver {} report: {}", kind, e),
            }
        })
    }

    /// Re-send `report` once per configured delay, each copy tagged with its
    /// 1-based attempt ordinal. Attempts are independent: one failing does
    /// not cancel the others.
    pub fn send_attempts(&self, report: InteractionReport) -> Vec<JoinHandle<()>> {
        self.delays
            .iter()
            .enumerate()
            .map(|(index, delay)| {
                let sink = Arc::clone(&self.sink);
                let delay = *delay;
                let attempt = u8::try_from(index + 1).unwrap_or(u8::MAX);
                let report = report.as_attempt(attempt);
                tokio::spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    let kind = report.content;
                    if let Err(e) = sink.deliver(report).await {
                        warn!("Critical {} attempt {} failed: {}", kind, attempt, e);
                    }
                })
            })
            .collect()
    }
}

/// Sink that forwards reports over an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<InteractionReport>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<InteractionReport>) -> Self {
        Self { tx }
    }

    /// A sink and the receiving end it feeds.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InteractionReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ReportSink for ChannelSink {
    async fn deliver(&self, report: InteractionReport) -> Result<ReportStatus, DeliveryError> {
        self.tx.send(report).map_err(|_| DeliveryError::Closed)?;
        Ok(ReportStatus::Received)
    }
}
