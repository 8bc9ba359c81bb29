//! Attribute map comparison.

use std::collections::BTreeSet;

use arbor_patch::AttributeChanges;
use arbor_tree::Attributes;

/// Changes turning `old` into `new`, skipping `ignored` names.
///
/// Added and changed attributes map to `Some(new value)`; attributes missing
/// from `new` map to `None`.
pub fn diff_attributes(
    old: &Attributes,
    new: &Attributes,
    ignored: &BTreeSet<String>,
) -> AttributeChanges {
    let mut changes = AttributeChanges::new();
    for (name, value) in new {
        if ignored.contains(name) {
            continue;
        }
        if old.get(name) != Some(value) {
            changes.insert(name.clone(), Some(value.clone()));
        }
    }
    for name in old.keys() {
        if !ignored.contains(name) && !new.contains_key(name) {
            changes.insert(name.clone(), None);
        }
    }
    changes
}
