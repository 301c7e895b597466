//! Point-in-time element snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ElementFingerprint, Rect, ScrollOffsets, TriggerElement, Viewport, VisibilityProvenance};

/// Keys whose values change as the user interacts and are ignored when
/// comparing element metadata.
pub const VOLATILE_KEYS: [&str; 4] = ["value", "innerText", "textContent", "data"];

/// Fixed set of semantic attributes captured for every element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SemanticAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_cy: Option<String>,
}

impl SemanticAttributes {
    /// DOM attribute names backing the fields above.
    pub const ATTRIBUTE_NAMES: [&'static str; 8] = [
        "aria-label",
        "name",
        "placeholder",
        "title",
        "role",
        "href",
        "type",
        "data-cy",
    ];

    /// Build from an attribute lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            aria_label: get("aria-label"),
            name: get("name"),
            placeholder: get("placeholder"),
            title: get("title"),
            role: get("role"),
            href: get("href"),
            input_type: get("type"),
            data_cy: get("data-cy"),
        }
    }

    /// Whether `attribute` is one of the structured fields (including `id`/`class`).
    pub fn is_known(attribute: &str) -> bool {
        attribute == "id" || attribute == "class" || Self::ATTRIBUTE_NAMES.contains(&attribute)
    }
}

/// The single live-content reading taken from an element at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum LiveContent {
    Value(String),
    InnerText(String),
    TextContent(String),
    Data(String),
}

impl LiveContent {
    pub fn text(&self) -> &str {
        match self {
            LiveContent::Value(s)
            | LiveContent::InnerText(s)
            | LiveContent::TextContent(s)
            | LiveContent::Data(s) => s,
        }
    }

    /// Metadata key this reading is reported under.
    pub fn key(&self) -> &'static str {
        match self {
            LiveContent::Value(_) => "value",
            LiveContent::InnerText(_) => "innerText",
            LiveContent::TextContent(_) => "textContent",
            LiveContent::Data(_) => "data",
        }
    }
}

/// Opaque pass-through metadata: every non-empty attribute not covered by
/// [`SemanticAttributes`], plus the live-content reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ElementData {
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<LiveContent>,
}

impl ElementData {
    pub fn typed_value(&self) -> Option<&str> {
        self.content.as_ref().map(LiveContent::text)
    }
}

/// One-level summary used for children and same-center elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub fingerprint: ElementFingerprint,
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub semantic: SemanticAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(flatten)]
    pub rect: Rect,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub data: ElementData,
}

/// Summary of an interactable element sharing the captured element's parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiblingSummary {
    #[serde(flatten)]
    pub summary: ElementSummary,
    pub is_enabled: bool,
    pub is_visible: bool,
    /// The sibling itself (or a descendant) is what a point query at its center hits.
    pub is_clickable: bool,
    /// Direct text nodes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_text: Option<String>,
}

/// Full capture of the element involved in an interaction.
///
/// Created fresh for every observed interaction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub fingerprint: ElementFingerprint,
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub semantic: SemanticAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(flatten)]
    pub rect: Rect,
    /// Viewport-relative center.
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub scroll: ScrollOffsets,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(rename = "visible_from")]
    pub provenance: VisibilityProvenance,
    #[serde(rename = "nested_element", default)]
    pub children: Vec<ElementSummary>,
    #[serde(rename = "same_level_elements", default)]
    pub siblings: Vec<SiblingSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub same_center_elements: Vec<ElementSummary>,
    #[serde(default)]
    pub data: ElementData,
}

impl ElementSnapshot {
    pub fn center(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn typed_value(&self) -> Option<&str> {
        self.data.typed_value()
    }

    /// Identity recorded as the cause of elements revealed by this interaction.
    pub fn trigger(&self) -> TriggerElement {
        TriggerElement {
            fingerprint: self.fingerprint.clone(),
            tag_name: self.tag_name.clone(),
            id: self.id.clone(),
            text: self.text_content.clone(),
        }
    }
}
