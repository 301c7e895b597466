//! Host events fed to the observer and the outcome of handling them.

use crate::dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    MouseDown,
    PointerDown,
    Click,
}

/// Pointer event with viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub target: NodeId,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, target: NodeId, x: f64, y: f64) -> Self {
        Self { kind, target, x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub target: NodeId,
    /// False for synthetic events dispatched by page script.
    pub is_user_input: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub target: Option<NodeId>,
}

impl KeyEvent {
    pub fn enter(target: Option<NodeId>) -> Self {
        Self {
            key: "Enter".to_string(),
            target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitEvent {
    pub form: NodeId,
}

/// Why an event produced no report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Another pointer event was handled within the debounce interval.
    Debounced,
    /// A previous Enter is still in its cool-down.
    EnterCooldown,
    /// Enter on the same element within the repeat window.
    RepeatedEnter,
    /// Submit caused by an Enter that was already reported.
    SubmitAfterEnter,
    /// Emergency capture already fired in this navigation episode.
    NavigationAlreadyCaptured,
    NotUserInput,
    NotTextEntry,
    NotEnter,
    NoFocusedElement,
    /// The element is no longer in the document.
    Detached,
}

/// What the observer did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Suppressed(SuppressReason),
    /// Sent once through the standard path.
    Standard,
    /// Critical attempts scheduled; `standard` tells whether a standard send
    /// went out as well.
    Critical { standard: bool },
    /// The critical send was dropped by the dedupe ledger.
    Deduplicated { standard: bool },
}

impl Dispatch {
    /// Whether anything was sent to the recorder.
    pub fn is_sent(&self) -> bool {
        matches!(
            self,
            Dispatch::Standard | Dispatch::Critical { .. } | Dispatch::Deduplicated { standard: true }
        )
    }
}
