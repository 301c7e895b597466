//! In-memory DOM used by tests and offline simulation.

use std::cmp::Reverse;

use parking_lot::RwLock;
use steptrail_protocols::{Rect, ScrollOffsets, Viewport};

use super::page_dom::{ComputedStyle, NodeId, PageDom, ReadyState};

/// Description of an element to append to a [`MemoryDom`].
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub value: Option<String>,
    pub rect: Rect,
    pub style: ComputedStyle,
    pub click_handler: bool,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn rect(mut self, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(left, top, width, height);
        self
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.style.z_index = Some(z);
        self
    }

    pub fn style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.style.display = "none".to_string();
        self
    }

    pub fn click_handler(mut self) -> Self {
        self.click_handler = true;
        self
    }
}

#[derive(Debug, Clone)]
struct MemoryNode {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    value: Option<String>,
    rect: Rect,
    style: ComputedStyle,
    click_handler: bool,
    attached: bool,
}

impl MemoryNode {
    fn from_spec(spec: ElementSpec, parent: Option<NodeId>) -> Self {
        Self {
            tag: spec.tag,
            parent,
            children: Vec::new(),
            attributes: spec.attributes,
            text: spec.text,
            value: spec.value,
            rect: spec.rect,
            style: spec.style,
            click_handler: spec.click_handler,
            attached: true,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
struct DomState {
    nodes: Vec<MemoryNode>,
    root: Option<NodeId>,
    location: String,
    viewport: Viewport,
    scroll: ScrollOffsets,
    ready_state: ReadyState,
    active: Option<NodeId>,
}

impl DomState {
    fn get(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id.0).filter(|node| node.attached)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut MemoryNode> {
        self.nodes.get_mut(id.0).filter(|node| node.attached)
    }

    fn document_order(&self) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                result.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        result
    }

    /// Self and ancestors, nearest first.
    fn lineage(&self, id: NodeId) -> impl Iterator<Item = &MemoryNode> + '_ {
        std::iter::successors(self.get(id), move |node| node.parent.and_then(|p| self.get(p)))
    }

    fn is_rendered(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.lineage(id).all(|node| !node.style.is_display_none())
    }

    /// Nearest explicit z-index up the ancestor chain.
    fn stacking_z(&self, id: NodeId) -> i32 {
        self.lineage(id)
            .find_map(|node| node.style.z_index)
            .unwrap_or(0)
    }

    fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        let mut text = node.text.clone().unwrap_or_default();
        for child in &node.children {
            text.push_str(&self.text_content(*child));
        }
        text
    }

    fn detach(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.attached = false;
                std::mem::take(&mut node.children)
            }
            None => return,
        };
        for child in children {
            self.detach(child);
        }
        if self.active == Some(id) {
            self.active = None;
        }
    }
}

/// A mutable DOM held entirely in memory.
///
/// Rendering is modelled just far enough for the observer: a node is
/// rendered when neither it nor an ancestor is `display: none`, and point
/// queries stack nodes by the nearest explicit `z-index` up their ancestor
/// chain, then by later document order.
#[derive(Debug)]
pub struct MemoryDom {
    state: RwLock<DomState>,
}

impl MemoryDom {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(DomState {
                nodes: Vec::new(),
                root: None,
                location: url.into(),
                viewport: Viewport::default(),
                scroll: ScrollOffsets::default(),
                ready_state: ReadyState::Complete,
                active: None,
            }),
        }
    }

    pub fn with_viewport(self, viewport: Viewport) -> Self {
        self.state.write().viewport = viewport;
        self
    }

    /// Create the document element. Replaces any previous tree.
    pub fn create_root(&self, spec: ElementSpec) -> NodeId {
        let mut state = self.state.write();
        if let Some(old) = state.root {
            state.detach(old);
        }
        let id = NodeId(state.nodes.len());
        state.nodes.push(MemoryNode::from_spec(spec, None));
        state.root = Some(id);
        id
    }

    /// Append a child element. Appending under a detached parent creates a
    /// detached node.
    pub fn append(&self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let mut state = self.state.write();
        let id = NodeId(state.nodes.len());
        let mut node = MemoryNode::from_spec(spec, Some(parent));
        match state.get_mut(parent) {
            Some(parent_node) => parent_node.children.push(id),
            None => node.attached = false,
        }
        state.nodes.push(node);
        id
    }

    /// Detach a node and its subtree.
    pub fn remove(&self, node: NodeId) {
        let mut state = self.state.write();
        let parent = state.get(node).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| state.get_mut(p)) {
            parent.children.retain(|child| *child != node);
        }
        if state.root == Some(node) {
            state.root = None;
        }
        state.detach(node);
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        if let Some(n) = self.state.write().get_mut(node) {
            n.rect = rect;
        }
    }

    pub fn update_style<F>(&self, node: NodeId, update: F)
    where
        F: FnOnce(&mut ComputedStyle),
    {
        if let Some(n) = self.state.write().get_mut(node) {
            update(&mut n.style);
        }
    }

    pub fn show(&self, node: NodeId) {
        self.update_style(node, |style| {
            style.display = "block".to_string();
            style.visibility = "visible".to_string();
        });
    }

    pub fn hide(&self, node: NodeId) {
        self.update_style(node, |style| style.display = "none".to_string());
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(n) = self.state.write().get_mut(node) {
            let value = value.into();
            match n.attributes.iter_mut().find(|(key, _)| key == name) {
                Some(entry) => entry.1 = value,
                None => n.attributes.push((name.to_string(), value)),
            }
        }
    }

    pub fn set_value(&self, node: NodeId, value: impl Into<String>) {
        if let Some(n) = self.state.write().get_mut(node) {
            n.value = Some(value.into());
        }
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) {
        if let Some(n) = self.state.write().get_mut(node) {
            n.text = Some(text.into());
        }
    }

    pub fn set_location(&self, url: impl Into<String>) {
        self.state.write().location = url.into();
    }

    pub fn focus(&self, node: Option<NodeId>) {
        let mut state = self.state.write();
        state.active = node.filter(|id| state.get(*id).is_some());
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.write().ready_state = ready_state;
    }

    pub fn set_scroll(&self, scroll: ScrollOffsets) {
        self.state.write().scroll = scroll;
    }
}

impl PageDom for MemoryDom {
    fn root(&self) -> Option<NodeId> {
        self.state.read().root
    }

    fn all_elements(&self) -> Vec<NodeId> {
        self.state.read().document_order()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.state.read().get(node).map(|n| n.tag.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let state = self.state.read();
        state
            .get(node)
            .and_then(|n| n.parent)
            .filter(|p| state.get(*p).is_some())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .read()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.state
            .read()
            .get(node)
            .map(|n| n.attributes.clone())
            .unwrap_or_default()
    }

    fn has_click_handler(&self, node: NodeId) -> bool {
        self.state
            .read()
            .get(node)
            .is_some_and(|n| n.click_handler)
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let state = self.state.read();
        state.get(node)?;
        Some(state.text_content(node))
    }

    fn own_text(&self, node: NodeId) -> Option<String> {
        self.state.read().get(node).and_then(|n| n.text.clone())
    }

    fn value(&self, node: NodeId) -> Option<String> {
        let state = self.state.read();
        let n = state.get(node)?;
        match n.value.clone() {
            Some(value) => Some(value),
            None if matches!(n.tag.as_str(), "input" | "textarea" | "select") => {
                Some(String::new())
            }
            None => None,
        }
    }

    fn is_disabled(&self, node: NodeId) -> bool {
        self.state
            .read()
            .get(node)
            .is_some_and(|n| n.attribute("disabled").is_some())
    }

    fn is_content_editable(&self, node: NodeId) -> bool {
        let state = self.state.read();
        for n in state.lineage(node) {
            match n.attribute("contenteditable") {
                Some("false") => return false,
                Some(_) => return true,
                None => {}
            }
        }
        false
    }

    fn style(&self, node: NodeId) -> ComputedStyle {
        self.state
            .read()
            .get(node)
            .map(|n| n.style.clone())
            .unwrap_or_default()
    }

    fn rect(&self, node: NodeId) -> Rect {
        let state = self.state.read();
        if !state.is_rendered(node) {
            return Rect::default();
        }
        state.get(node).map(|n| n.rect).unwrap_or_default()
    }

    fn elements_from_point(&self, x: f64, y: f64) -> Vec<NodeId> {
        let state = self.state.read();
        let mut hits: Vec<(i32, usize, NodeId)> = state
            .document_order()
            .into_iter()
            .enumerate()
            .filter(|(_, id)| state.is_rendered(*id))
            .filter_map(|(order, id)| {
                let node = state.get(id)?;
                let hit = !node.style.is_visibility_hidden()
                    && !node.style.ignores_pointer()
                    && !node.rect.is_empty()
                    && node.rect.contains(x, y);
                hit.then(|| (state.stacking_z(id), order, id))
            })
            .collect();
        hits.sort_by_key(|(z, order, _)| (Reverse(*z), Reverse(*order)));
        hits.into_iter().map(|(_, _, id)| id).collect()
    }

    fn active_element(&self) -> Option<NodeId> {
        let state = self.state.read();
        state.active.filter(|id| state.get(*id).is_some())
    }

    fn location(&self) -> String {
        self.state.read().location.clone()
    }

    fn viewport(&self) -> Viewport {
        self.state.read().viewport
    }

    fn scroll(&self) -> ScrollOffsets {
        self.state.read().scroll
    }

    fn ready_state(&self) -> ReadyState {
        self.state.read().ready_state
    }
}
