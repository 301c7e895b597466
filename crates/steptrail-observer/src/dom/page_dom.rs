//! The `PageDom` trait.

use serde::{Deserialize, Serialize};
use steptrail_protocols::{Rect, ScrollOffsets, Viewport};

/// Handle to an element node inside one [`PageDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Subset of the computed style that the observer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    pub pointer_events: String,
    /// `None` for `z-index: auto`.
    pub z_index: Option<i32>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            pointer_events: "auto".to_string(),
            z_index: None,
        }
    }
}

impl ComputedStyle {
    pub fn is_display_none(&self) -> bool {
        self.display == "none"
    }

    pub fn is_visibility_hidden(&self) -> bool {
        self.visibility == "hidden"
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity <= 0.0
    }

    pub fn ignores_pointer(&self) -> bool {
        self.pointer_events == "none"
    }

    /// Resolved stacking order; `auto` compares as zero.
    pub fn z_order(&self) -> i32 {
        self.z_index.unwrap_or(0)
    }
}

/// Document loading phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    Loading,
    Interactive,
    #[default]
    Complete,
}

/// Read access to the host page.
///
/// Unknown or detached nodes answer `None`, empty collections or default
/// values; implementations must never panic on a stale [`NodeId`].
pub trait PageDom: Send + Sync {
    /// The document element (`<html>`).
    fn root(&self) -> Option<NodeId>;

    /// All attached elements in document order.
    fn all_elements(&self) -> Vec<NodeId>;

    /// Lowercase tag name; `None` for a detached or unknown node.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Attributes in source order.
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attributes(node)
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether a click handler is installed as a property (not an attribute).
    fn has_click_handler(&self, node: NodeId) -> bool;

    /// Concatenated text of the node and all descendants.
    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Rendered text; hosts without layout may answer the text content.
    fn inner_text(&self, node: NodeId) -> Option<String> {
        self.text_content(node)
    }

    /// Text of the node's direct text children only.
    fn own_text(&self, node: NodeId) -> Option<String>;

    /// Character data, for the rare elements that expose it.
    fn character_data(&self, _node: NodeId) -> Option<String> {
        None
    }

    /// Live value of a form control; `None` for elements without one.
    fn value(&self, node: NodeId) -> Option<String>;

    fn is_disabled(&self, node: NodeId) -> bool;

    fn is_content_editable(&self, node: NodeId) -> bool;

    fn style(&self, node: NodeId) -> ComputedStyle;

    /// Bounding box in viewport coordinates; empty when not rendered.
    fn rect(&self, node: NodeId) -> Rect;

    /// Elements under a point, topmost first.
    fn elements_from_point(&self, x: f64, y: f64) -> Vec<NodeId>;

    /// Inclusive: a node contains itself.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Ancestors from the parent up to the root.
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(node);
        while let Some(id) = current {
            result.push(id);
            current = self.parent(id);
        }
        result
    }

    /// All descendants in document order.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        result
    }

    fn active_element(&self) -> Option<NodeId>;

    /// Full current URL.
    fn location(&self) -> String;

    fn viewport(&self) -> Viewport;

    fn scroll(&self) -> ScrollOffsets;

    fn ready_state(&self) -> ReadyState;

    /// The `<body>` element, if present.
    fn body(&self) -> Option<NodeId> {
        let root = self.root()?;
        self.children(root)
            .into_iter()
            .find(|child| self.tag_name(*child).as_deref() == Some("body"))
    }
}
