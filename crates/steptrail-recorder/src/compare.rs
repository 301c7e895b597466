//! Cross-message duplicate detection.

use std::collections::BTreeSet;

use steptrail_protocols::{ElementData, ElementSnapshot, VOLATILE_KEYS};

use crate::step::SessionEntry;

/// Compare element metadata, ignoring volatile keys.
///
/// The live-content reading is always volatile, so only the tag and the
/// non-volatile attributes take part.
pub fn element_data_identical(a: Option<&ElementData>, b: Option<&ElementData>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    if a.tag_name != b.tag_name {
        return false;
    }

    let keys: BTreeSet<&str> = a
        .attributes
        .keys()
        .chain(b.attributes.keys())
        .map(String::as_str)
        .filter(|key| !VOLATILE_KEYS.contains(key))
        .collect();
    keys.into_iter()
        .all(|key| a.attributes.get(key) == b.attributes.get(key))
}

/// Compare the full element metadata: identity attributes, the semantic
/// fields and the opaque data. Text content is volatile and skipped.
pub fn element_metadata_identical(a: Option<&ElementSnapshot>, b: Option<&ElementSnapshot>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    a.id == b.id
        && a.class_name == b.class_name
        && a.semantic == b.semantic
        && element_data_identical(Some(&a.data), Some(&b.data))
}

/// Whether `entry` repeats `last`: same action, URL, element fingerprint
/// and element metadata.
pub fn entries_identical(entry: &SessionEntry, last: &SessionEntry) -> bool {
    if entry.action != last.action || entry.url != last.url {
        return false;
    }
    if entry.fingerprint() != last.fingerprint() {
        return false;
    }
    element_metadata_identical(entry.element.as_ref(), last.element.as_ref())
}
