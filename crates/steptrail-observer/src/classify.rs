//! Element classification predicates.

use crate::dom::{NodeId, PageDom};

/// Tags that are interactive by themselves.
pub const INTERACTIVE_TAGS: [&str; 5] = ["input", "textarea", "select", "button", "a"];

/// ARIA roles that mark an element as interactive.
pub const INTERACTIVE_ROLES: [&str; 7] = [
    "button", "link", "checkbox", "radio", "tab", "menuitem", "combobox",
];

/// Text-bearing tags that count as interactable when their text is short.
pub const TEXT_TAGS: [&str; 9] = ["h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "li"];

const MAX_TEXT_LEN: usize = 200;
const MAX_VIEWPORT_SHARE: f64 = 0.9;

/// Visible: rendered, non-empty, not a full-viewport backdrop, and
/// intersecting the viewport.
pub fn is_visible(dom: &dyn PageDom, node: NodeId) -> bool {
    let style = dom.style(node);
    if style.is_display_none() || style.is_visibility_hidden() || style.is_transparent() {
        return false;
    }

    let rect = dom.rect(node);
    if rect.is_empty() {
        return false;
    }

    let viewport = dom.viewport();
    if rect.covers_viewport(&viewport) {
        return false;
    }

    rect.intersects_viewport(&viewport)
}

/// Whether `node` can receive a pointer event at (x, y).
pub fn is_hit_candidate(dom: &dyn PageDom, node: NodeId, x: f64, y: f64) -> bool {
    let style = dom.style(node);
    if style.is_display_none()
        || style.is_visibility_hidden()
        || style.is_transparent()
        || style.ignores_pointer()
    {
        return false;
    }
    let rect = dom.rect(node);
    !rect.is_empty() && rect.contains(x, y)
}

/// Narrow predicate used to pick sibling summaries.
pub fn is_interactable(dom: &dyn PageDom, node: NodeId) -> bool {
    let rect = dom.rect(node);
    if rect.is_empty() {
        return false;
    }
    let style = dom.style(node);
    if style.is_display_none() || style.is_visibility_hidden() {
        return false;
    }

    let Some(tag) = dom.tag_name(node) else {
        return false;
    };
    if INTERACTIVE_TAGS.contains(&tag.as_str()) {
        return true;
    }

    if let Some(role) = dom.attribute(node, "role") {
        if INTERACTIVE_ROLES.contains(&role.as_str()) {
            return true;
        }
    }

    if TEXT_TAGS.contains(&tag.as_str()) {
        let text = dom.text_content(node).unwrap_or_default();
        let len = text.trim().chars().count();
        if len > 0 && len < MAX_TEXT_LEN {
            return rect.area() / dom.viewport().area() < MAX_VIEWPORT_SHARE;
        }
    }

    false
}

/// Whether activating `node` is expected to navigate or lose page state.
pub fn is_navigational(dom: &dyn PageDom, node: NodeId) -> bool {
    let Some(tag) = dom.tag_name(node) else {
        return false;
    };
    let lower = |name: &str| dom.attribute(node, name).map(|v| v.to_lowercase());
    let role = lower("role");

    if tag == "a" || tag == "button" {
        return true;
    }
    if tag == "input" && lower("type").as_deref() == Some("submit") {
        return true;
    }
    if role.as_deref() == Some("button") {
        return true;
    }
    if dom.attribute(node, "href").is_some() {
        return true;
    }
    if dom.has_click_handler(node) || dom.attribute(node, "onclick").is_some() {
        return true;
    }

    if tag == "input" || role.as_deref() == Some("search") {
        return ["name", "placeholder", "id"]
            .iter()
            .filter_map(|name| lower(*name))
            .any(|value| value.contains("search"));
    }

    false
}

/// Targets whose input events are reported as typing.
pub fn is_text_entry(dom: &dyn PageDom, node: NodeId) -> bool {
    match dom.tag_name(node).as_deref() {
        Some("input" | "textarea" | "select") => true,
        Some(_) => dom.is_content_editable(node),
        None => false,
    }
}
