//! Session steps and the session-JSON entries that get encrypted on save.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steptrail_protocols::{ElementSnapshot, LiveContent};
use uuid::Uuid;

/// Action recorded by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Click,
    Typed,
    Enter,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::Click => "click",
            ActionKind::Typed => "typed",
            ActionKind::Enter => "enter",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One numbered step as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStep {
    pub id: Uuid,
    pub step_id: u64,
    pub kind: ActionKind,
    /// Element fingerprint, or the cleaned hostname for `navigate`.
    pub path: String,
    pub url: String,
    /// `None` only for `navigate`.
    pub element: Option<ElementSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionStep {
    /// Human-readable label: the first non-empty descriptive field of the
    /// element, falling back to the step path.
    pub fn display_name(&self) -> String {
        let Some(element) = &self.element else {
            return self.path.clone();
        };

        let (inner_text, value, data) = match &element.data.content {
            Some(LiveContent::InnerText(s)) => (Some(s.clone()), None, None),
            Some(LiveContent::Value(s)) => (None, Some(s.clone()), None),
            Some(LiveContent::Data(s)) => (None, None, Some(s.clone())),
            _ => (None, None, None),
        };
        let candidates = [
            element.text_content.clone(),
            inner_text,
            element.semantic.aria_label.clone(),
            element.semantic.name.clone(),
            element.semantic.placeholder.clone(),
            value,
            data,
            element.semantic.href.clone(),
            element.semantic.title.clone(),
            Some(element.tag_name.clone()),
            element.semantic.input_type.clone(),
        ];

        candidates
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
            .unwrap_or_else(|| self.path.clone())
    }
}

/// Entry of the session JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub step_id: u64,
    pub url: String,
    pub action: ActionKind,
    pub element: Option<ElementSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard_input: Option<String>,
    /// Present on the seeded `navigate` entry only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SessionEntry {
    pub fn fingerprint(&self) -> Option<&str> {
        self.element.as_ref().map(|e| e.fingerprint.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steptrail_protocols::{
        ElementData, ElementFingerprint, Rect, ScrollOffsets, SemanticAttributes, Viewport,
        VisibilityProvenance,
    };

    fn element(tag: &str) -> ElementSnapshot {
        ElementSnapshot {
            fingerprint: ElementFingerprint::new(format!("/html/body/{}", tag)),
            tag_name: tag.to_string(),
            id: None,
            class_name: None,
            semantic: SemanticAttributes::default(),
            text_content: None,
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            x: 5.0,
            y: 5.0,
            scroll: ScrollOffsets::default(),
            viewport: Viewport::default(),
            provenance: VisibilityProvenance::page("https://example.com/"),
            children: vec![],
            siblings: vec![],
            same_center_elements: vec![],
            data: ElementData {
                tag_name: tag.to_string(),
                ..Default::default()
            },
        }
    }

    fn step(element: Option<ElementSnapshot>) -> SessionStep {
        SessionStep {
            id: Uuid::new_v4(),
            step_id: 2,
            kind: ActionKind::Click,
            path: "/html/body/input".to_string(),
            url: "https://example.com/".to_string(),
            element,
            input: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_action_kind_serde() {
        assert_eq!(serde_json::to_value(ActionKind::Typed).unwrap(), "typed");
        let kind: ActionKind = serde_json::from_value(serde_json::json!("navigate")).unwrap();
        assert_eq!(kind, ActionKind::Navigate);
        assert_eq!(ActionKind::Enter.to_string(), "enter");
    }

    #[test]
    fn test_display_name_prefers_text() {
        let mut input = element("input");
        input.semantic.placeholder = Some("Search".to_string());
        input.text_content = Some("   ".to_string());
        assert_eq!(step(Some(input.clone())).display_name(), "Search");

        input.semantic.aria_label = Some("Site search".to_string());
        assert_eq!(step(Some(input)).display_name(), "Site search");
    }

    #[test]
    fn test_display_name_uses_live_content() {
        let mut link = element("a");
        link.semantic.href = Some("/about".to_string());
        link.data.content = Some(LiveContent::InnerText("About us".to_string()));
        assert_eq!(step(Some(link)).display_name(), "About us");
    }

    #[test]
    fn test_display_name_falls_back_to_tag_then_path() {
        assert_eq!(step(Some(element("div"))).display_name(), "div");
        assert_eq!(step(None).display_name(), "/html/body/input");
    }

    #[test]
    fn test_navigate_entry_serializes_null_element() {
        let entry = SessionEntry {
            step_id: 1,
            url: "https://www.example.com/docs".to_string(),
            action: ActionKind::Navigate,
            element: None,
            keyboard_input: None,
            step_type: Some("act".to_string()),
            timestamp: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["element"].is_null());
        assert_eq!(json["step_type"], "act");
        assert!(json.get("keyboard_input").is_none());
        assert_eq!(entry.fingerprint(), None);
    }
}
