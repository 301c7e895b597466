//! Element snapshot construction.

use std::collections::BTreeMap;

use steptrail_protocols::{
    ElementData, ElementSnapshot, ElementSummary, LiveContent, SemanticAttributes, SiblingSummary,
    VisibilityProvenance,
};

use crate::classify::is_interactable;
use crate::dom::{NodeId, PageDom};
use crate::fingerprint::fingerprint;
use crate::hit_test::same_center_elements;

/// Builds snapshots and summaries from a [`PageDom`].
pub struct SnapshotBuilder<'a> {
    dom: &'a dyn PageDom,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(dom: &'a dyn PageDom) -> Self {
        Self { dom }
    }

    /// Full snapshot of `node`, or `None` when it is detached.
    pub fn snapshot(&self, node: NodeId, provenance: VisibilityProvenance) -> Option<ElementSnapshot> {
        let dom = self.dom;
        let tag_name = dom.tag_name(node)?;
        let fingerprint = fingerprint(dom, node)?;
        let rect = dom.rect(node);
        let (x, y) = rect.center();

        Some(ElementSnapshot {
            fingerprint,
            tag_name,
            id: self.non_empty_attribute(node, "id"),
            class_name: self.non_empty_attribute(node, "class"),
            semantic: SemanticAttributes::from_lookup(|name| dom.attribute(node, name)),
            text_content: trimmed(dom.text_content(node)),
            rect,
            x,
            y,
            scroll: dom.scroll(),
            viewport: dom.viewport(),
            provenance,
            children: dom
                .children(node)
                .into_iter()
                .filter_map(|child| self.summary(child))
                .collect(),
            siblings: self.siblings(node),
            same_center_elements: Vec::new(),
            data: self.element_data(node, true),
        })
    }

    /// One-level summary without children or provenance.
    pub fn summary(&self, node: NodeId) -> Option<ElementSummary> {
        let dom = self.dom;
        let tag_name = dom.tag_name(node)?;
        let rect = dom.rect(node);
        let (x, y) = rect.center();
        Some(ElementSummary {
            fingerprint: fingerprint(dom, node)?,
            tag_name,
            id: self.non_empty_attribute(node, "id"),
            class_name: self.non_empty_attribute(node, "class"),
            semantic: SemanticAttributes::from_lookup(|name| dom.attribute(node, name)),
            text_content: trimmed(dom.text_content(node)),
            rect,
            x,
            y,
            data: self.element_data(node, false),
        })
    }

    /// Interactable siblings sharing `node`'s parent.
    pub fn siblings(&self, node: NodeId) -> Vec<SiblingSummary> {
        let dom = self.dom;
        let Some(parent) = dom.parent(node) else {
            return Vec::new();
        };
        dom.children(parent)
            .into_iter()
            .filter(|sibling| *sibling != node && is_interactable(dom, *sibling))
            .filter_map(|sibling| self.sibling(sibling))
            .collect()
    }

    fn sibling(&self, node: NodeId) -> Option<SiblingSummary> {
        let dom = self.dom;
        let summary = self.summary(node)?;
        let style = dom.style(node);
        let (cx, cy) = summary.rect.center();
        let is_clickable = dom
            .elements_from_point(cx, cy)
            .first()
            .is_some_and(|hit| dom.contains(node, *hit));

        Some(SiblingSummary {
            summary,
            is_enabled: !dom.is_disabled(node),
            is_visible: !(style.is_display_none()
                || style.is_visibility_hidden()
                || style.is_transparent()),
            is_clickable,
            element_text: trimmed(dom.own_text(node)),
        })
    }

    /// Summaries of visible elements sharing `center` within `tolerance`.
    pub fn same_center(&self, center: (f64, f64), tolerance: f64) -> Vec<ElementSummary> {
        same_center_elements(self.dom, center, tolerance)
            .into_iter()
            .filter_map(|node| self.summary(node))
            .collect()
    }

    /// Opaque attributes plus the live-content reading.
    ///
    /// The captured element itself reports an empty form value; summaries
    /// only report non-empty values.
    pub fn element_data(&self, node: NodeId, keep_empty_value: bool) -> ElementData {
        let dom = self.dom;
        let attributes: BTreeMap<String, String> = dom
            .attributes(node)
            .into_iter()
            .filter(|(name, _)| !SemanticAttributes::is_known(name))
            .filter_map(|(name, value)| {
                let value = value.trim();
                (!value.is_empty()).then(|| (name, value.to_string()))
            })
            .collect();

        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        let value = match dom.value(node) {
            Some(value) if keep_empty_value || !value.is_empty() => Some(value),
            _ => None,
        };
        let content = value
            .map(LiveContent::Value)
            .or_else(|| non_empty(dom.inner_text(node)).map(LiveContent::InnerText))
            .or_else(|| non_empty(dom.text_content(node)).map(LiveContent::TextContent))
            .or_else(|| non_empty(dom.character_data(node)).map(LiveContent::Data));

        ElementData {
            tag_name: dom.tag_name(node).unwrap_or_default(),
            attributes,
            content,
        }
    }

    fn non_empty_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attribute(node, name).filter(|v| !v.is_empty())
    }
}

fn trimmed(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
