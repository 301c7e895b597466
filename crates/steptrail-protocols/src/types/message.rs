//! Interaction report message exchanged between observer and recorder.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ElementSnapshot;

/// Kind of interaction carried by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Clicked,
    Typed,
    Enter,
    FormSubmit,
    EmergencyNavigationCapture,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Clicked => "clicked",
            MessageKind::Typed => "typed",
            MessageKind::Enter => "enter",
            MessageKind::FormSubmit => "form_submit",
            MessageKind::EmergencyNavigationCapture => "emergency_navigation_capture",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Programmatic navigation entry point that triggered an emergency capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationMethod {
    PushState,
    ReplaceState,
    PopState,
}

/// Report sent from a page observer to the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionReport {
    pub content: MessageKind,
    pub details: ElementSnapshot,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_input: Option<String>,
    /// Set only on critical-path deliveries.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub critical: bool,
    /// 1-based attempt ordinal, critical-path deliveries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u8>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<NavigationMethod>,
}

impl InteractionReport {
    pub fn new(content: MessageKind, details: ElementSnapshot, url: impl Into<String>) -> Self {
        Self {
            content,
            details,
            url: url.into(),
            input_value: None,
            tracked_input: None,
            critical: false,
            attempt: None,
            timestamp: None,
            method: None,
        }
    }

    /// Attach the typed value; it is reported both as input and tracked input.
    pub fn with_input(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.tracked_input = Some(value.clone());
        self.input_value = Some(value);
        self
    }

    pub fn with_timestamp(mut self, unix_millis: i64) -> Self {
        self.timestamp = Some(unix_millis);
        self
    }

    pub fn with_method(mut self, method: NavigationMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Copy of this report tagged as critical-path attempt `attempt`.
    pub fn as_attempt(&self, attempt: u8) -> Self {
        let mut report = self.clone();
        report.critical = true;
        report.attempt = Some(attempt);
        report
    }
}

/// Acknowledgement returned by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Received,
    NotRecording,
}
