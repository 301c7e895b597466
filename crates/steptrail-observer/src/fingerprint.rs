//! Positional element fingerprints.

use steptrail_protocols::ElementFingerprint;

use crate::dom::{NodeId, PageDom};

/// Compute the root-relative positional path of `node`.
///
/// The document element and any tag that is unique among its siblings get
/// a bare tag name; otherwise the 1-based ordinal among same-tag siblings is
/// appended, e.g. `/html/body/div[2]/a`. Returns `None` for a detached node.
pub fn fingerprint(dom: &dyn PageDom, node: NodeId) -> Option<ElementFingerprint> {
    let root = dom.root();
    let mut parts = Vec::new();
    let mut current = Some(node);

    while let Some(id) = current {
        let tag = dom.tag_name(id)?;
        let parent = dom.parent(id);
        let part = match parent {
            Some(parent) if Some(id) != root => {
                let same_tag: Vec<NodeId> = dom
                    .children(parent)
                    .into_iter()
                    .filter(|sibling| dom.tag_name(*sibling).as_deref() == Some(tag.as_str()))
                    .collect();
                if same_tag.len() > 1 {
                    let ordinal = same_tag.iter().position(|sibling| *sibling == id)? + 1;
                    format!("{}[{}]", tag, ordinal)
                } else {
                    tag
                }
            }
            _ => tag,
        };
        parts.push(part);
        current = parent;
    }

    parts.reverse();
    Some(ElementFingerprint::new(format!("/{}", parts.join("/"))))
}
