//! Visibility provenance.

use serde::{Deserialize, Serialize};

use super::ElementFingerprint;

/// Identity of the element whose interaction revealed another element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerElement {
    pub fingerprint: ElementFingerprint,
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Why an element is visible: present at page settle, or revealed by an
/// earlier interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", content = "context", rename_all = "snake_case")]
pub enum VisibilityProvenance {
    /// Visible at initial page-load settle; carries the base URL.
    Page(String),
    /// Revealed as a side effect of interacting with the trigger element.
    Interaction(Box<TriggerElement>),
}

impl VisibilityProvenance {
    pub fn page(base_url: impl Into<String>) -> Self {
        VisibilityProvenance::Page(base_url.into())
    }

    pub fn interaction(trigger: TriggerElement) -> Self {
        VisibilityProvenance::Interaction(Box::new(trigger))
    }

    pub fn is_page(&self) -> bool {
        matches!(self, VisibilityProvenance::Page(_))
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self, VisibilityProvenance::Interaction(_))
    }
}
