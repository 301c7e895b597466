//! JSON fixtures for building a [`MemoryDom`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use steptrail_protocols::{Rect, ScrollOffsets, Viewport};

use super::memory::{ElementSpec, MemoryDom};
use super::page_dom::{ComputedStyle, NodeId, ReadyState};

/// A whole page: location, viewport and the element tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomFixture {
    pub url: String,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub scroll: ScrollOffsets,
    #[serde(default)]
    pub ready_state: ReadyState,
    pub root: NodeFixture,
}

/// One element. `key` names the node so scripts and tests can refer to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFixture {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub click_handler: bool,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub children: Vec<NodeFixture>,
}

impl NodeFixture {
    fn spec(&self) -> ElementSpec {
        ElementSpec {
            tag: self.tag.to_lowercase(),
            attributes: self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            text: self.text.clone(),
            value: self.value.clone(),
            rect: self.rect,
            style: self.style.clone(),
            click_handler: self.click_handler,
        }
    }
}

impl MemoryDom {
    /// Build a DOM from a fixture. Returns the DOM and the keyed nodes.
    pub fn from_fixture(fixture: &DomFixture) -> (Self, HashMap<String, NodeId>) {
        let dom = MemoryDom::new(fixture.url.clone()).with_viewport(fixture.viewport);
        dom.set_scroll(fixture.scroll);
        dom.set_ready_state(fixture.ready_state);

        let mut keys = HashMap::new();
        let root = dom.create_root(fixture.root.spec());
        register(&dom, &fixture.root, root, &mut keys);

        let mut pending: Vec<(NodeId, &NodeFixture)> = vec![(root, &fixture.root)];
        while let Some((id, node)) = pending.pop() {
            for child in &node.children {
                let child_id = dom.append(id, child.spec());
                register(&dom, child, child_id, &mut keys);
                pending.push((child_id, child));
            }
        }
        (dom, keys)
    }

    pub fn from_json(json: &str) -> Result<(Self, HashMap<String, NodeId>), serde_json::Error> {
        let fixture: DomFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(&fixture))
    }
}

fn register(
    dom: &MemoryDom,
    fixture: &NodeFixture,
    id: NodeId,
    keys: &mut HashMap<String, NodeId>,
) {
    if let Some(key) = &fixture.key {
        keys.insert(key.clone(), id);
    }
    if fixture.focused {
        dom.focus(Some(id));
    }
}
