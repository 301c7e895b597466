//! Report and snapshot builders for unit tests.

use steptrail_protocols::{
    ElementData, ElementFingerprint, ElementSnapshot, InteractionReport, LiveContent, MessageKind,
    Rect, ScrollOffsets, SemanticAttributes, Viewport, VisibilityProvenance,
};

pub(crate) const PAGE: &str = "https://www.example.com/docs";

pub(crate) fn snapshot(fingerprint: &str, tag: &str) -> ElementSnapshot {
    ElementSnapshot {
        fingerprint: ElementFingerprint::new(fingerprint),
        tag_name: tag.to_string(),
        id: None,
        class_name: None,
        semantic: SemanticAttributes::default(),
        text_content: None,
        rect: Rect::new(10.0, 20.0, 100.0, 40.0),
        x: 60.0,
        y: 40.0,
        scroll: ScrollOffsets::default(),
        viewport: Viewport::default(),
        provenance: VisibilityProvenance::page(PAGE),
        children: vec![],
        siblings: vec![],
        same_center_elements: vec![],
        data: ElementData {
            tag_name: tag.to_string(),
            ..Default::default()
        },
    }
}

pub(crate) fn report(kind: MessageKind, fingerprint: &str, tag: &str) -> InteractionReport {
    InteractionReport::new(kind, snapshot(fingerprint, tag), PAGE)
}

pub(crate) fn typed(fingerprint: &str, value: &str) -> InteractionReport {
    let mut snapshot = snapshot(fingerprint, "input");
    snapshot.data.content = Some(LiveContent::Value(value.to_string()));
    InteractionReport::new(MessageKind::Typed, snapshot, PAGE).with_input(value)
}
