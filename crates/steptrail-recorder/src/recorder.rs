//! Recording state machine and report handling.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use steptrail_protocols::{
    DeliveryError, InteractionReport, MessageKind, ReportSink, ReportStatus, Screenshot,
    ScreenshotCapturer,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::session::Session;
use crate::step::{ActionKind, SessionEntry, SessionStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    #[default]
    Start,
    Recording,
    Paused,
}

/// What happened to one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    NotRecording,
    Appended { step_id: u64 },
    /// Folded into the previous `typed` step.
    Coalesced { step_id: u64 },
    /// Identical to the last accepted entry.
    Duplicate,
    /// A form submit or navigation capture. These only escalate delivery
    /// on the page side and never create a step.
    Signal,
}

/// Receives reports and maintains the live [`Session`].
pub struct SessionRecorder {
    session: Arc<Mutex<Session>>,
    state: Mutex<RecordingState>,
    capturer: Arc<dyn ScreenshotCapturer>,
}

impl SessionRecorder {
    pub fn new(capturer: Arc<dyn ScreenshotCapturer>) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            state: Mutex::new(RecordingState::Start),
            capturer,
        }
    }

    pub fn state(&self) -> RecordingState {
        *self.state.lock()
    }

    pub fn is_recording(&self) -> bool {
        self.state() == RecordingState::Recording
    }

    pub fn start(&self) {
        self.set_state(RecordingState::Recording);
    }

    pub fn pause(&self) {
        if self.state() == RecordingState::Recording {
            self.set_state(RecordingState::Paused);
        }
    }

    /// Record button: start and resume record, recording pauses.
    pub fn toggle(&self) -> RecordingState {
        let next = match self.state() {
            RecordingState::Start | RecordingState::Paused => RecordingState::Recording,
            RecordingState::Recording => RecordingState::Paused,
        };
        self.set_state(next);
        next
    }

    /// Discard the session and return to [`RecordingState::Start`].
    pub fn reset(&self) {
        self.session.lock().clear();
        self.set_state(RecordingState::Start);
    }

    fn set_state(&self, next: RecordingState) {
        let mut state = self.state.lock();
        if *state != next {
            info!("Recording state {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    /// Apply one report to the session.
    ///
    /// Must run inside a tokio runtime: accepted steps spawn their
    /// screenshot capture.
    pub fn handle(&self, report: InteractionReport) -> RecordOutcome {
        if !self.is_recording() {
            debug!("Ignoring {} report while not recording", report.content);
            return RecordOutcome::NotRecording;
        }

        let kind = match report.content {
            MessageKind::Clicked => ActionKind::Click,
            MessageKind::Typed => ActionKind::Typed,
            MessageKind::Enter => ActionKind::Enter,
            MessageKind::FormSubmit | MessageKind::EmergencyNavigationCapture => {
                debug!("{} on {} is not a step", report.content, report.details.fingerprint);
                return RecordOutcome::Signal;
            }
        };

        let mut session = self.session.lock();
        if let Some(step_id) = session.seed_navigate(&report.url) {
            info!("Session starts at {} (step {})", report.url, step_id);
        }

        if kind == ActionKind::Typed {
            let fingerprint = report.details.fingerprint.to_string();
            if let Some(step_id) = session.coalesce_typed(&fingerprint, report.input_value.clone()) {
                return RecordOutcome::Coalesced { step_id };
            }
        }

        let (x, y) = report.details.center();
        let input = match kind {
            ActionKind::Typed | ActionKind::Enter => report.input_value,
            ActionKind::Navigate | ActionKind::Click => None,
        };
        let Some(step) = session.try_append(kind, &report.url, report.details, input) else {
            return RecordOutcome::Duplicate;
        };
        let step_id = step.step_id;
        let generation = session.generation();
        drop(session);

        debug!("Recorded {} step {}", kind, step_id);
        self.capture(step_id, x, y, generation);
        RecordOutcome::Appended { step_id }
    }

    /// Best-effort capture; failures never touch the step.
    fn capture(&self, step_id: u64, x: f64, y: f64, generation: u64) {
        let capturer = Arc::clone(&self.capturer);
        let session = Arc::clone(&self.session);
        tokio::spawn(async move {
            match capturer.capture(step_id, x, y).await {
                Ok(screenshot) => {
                    if !session.lock().attach_screenshot(generation, screenshot) {
                        debug!("Discarding screenshot for step {}", step_id);
                    }
                }
                Err(e) => warn!("Screenshot for step {} failed: {}", step_id, e),
            }
        });
    }

    /// Drain a report channel until every sender is gone.
    pub async fn pump(&self, mut rx: mpsc::UnboundedReceiver<InteractionReport>) -> usize {
        let mut handled = 0;
        while let Some(report) = rx.recv().await {
            self.handle(report);
            handled += 1;
        }
        handled
    }

    pub fn steps(&self) -> Vec<SessionStep> {
        self.session.lock().steps().to_vec()
    }

    pub fn step(&self, step_id: u64) -> Option<SessionStep> {
        self.session.lock().step(step_id).cloned()
    }

    pub fn steps_by_kind(&self, kind: ActionKind) -> Vec<SessionStep> {
        self.session
            .lock()
            .steps_by_kind(kind)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<SessionEntry> {
        self.session.lock().entries().to_vec()
    }

    pub fn screenshots(&self) -> Vec<Screenshot> {
        self.session.lock().screenshots().to_vec()
    }

    pub fn delete_step(&self, step_id: u64) -> bool {
        let deleted = self.session.lock().delete_step(step_id);
        if deleted {
            info!("Deleted step {}", step_id);
        }
        deleted
    }

    pub fn session_json(&self) -> serde_json::Result<String> {
        self.session.lock().to_json()
    }
}

#[async_trait]
impl ReportSink for SessionRecorder {
    async fn deliver(&self, report: InteractionReport) -> Result<ReportStatus, DeliveryError> {
        match self.handle(report) {
            RecordOutcome::NotRecording => Ok(ReportStatus::NotRecording),
            _ => Ok(ReportStatus::Received),
        }
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
