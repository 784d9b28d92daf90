//! Utilities for formatting and cross-document object copying.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, VecDeque};

/// Format a byte count for humans, e.g. `1.50 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Check whether an object is a node of a page tree (`/Page` or `/Pages`).
pub fn is_page_tree_node(obj: &Object) -> bool {
    let dict = match obj {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(|t| t.as_name()),
        Ok(b"Page") | Ok(b"Pages")
    )
}

/// Import `obj` from `source` into `target`.
///
/// Every reference is translated through `map`, which records source id to
/// target id for one source document. Referenced objects that are not mapped
/// yet get a fresh id in `target` and are copied as well, so an object shared
/// by several imports is copied exactly once per map.
///
/// Page tree nodes are never pulled in through a reference. Their target id
/// is reserved and holds `null` until the page itself is appended, which
/// keeps link annotations from dragging whole source documents along.
///
/// Dangling references become `null`.
pub fn import_object(
    target: &mut Document,
    source: &Document,
    map: &mut HashMap<ObjectId, ObjectId>,
    obj: &Object,
) -> Object {
    let mut pending = VecDeque::new();
    let imported = remap(target, map, &mut pending, obj);

    while let Some(source_id) = pending.pop_front() {
        let Some(&target_id) = map.get(&source_id) else {
            continue;
        };
        let copied = match source.get_object(source_id) {
            Ok(referenced) if is_page_tree_node(referenced) => Object::Null,
            Ok(referenced) => remap(target, map, &mut pending, referenced),
            Err(_) => {
                tracing::debug!(?source_id, "Dangling reference replaced by null");
                Object::Null
            }
        };
        target.objects.insert(target_id, copied);
    }

    imported
}

fn remap(
    target: &mut Document,
    map: &mut HashMap<ObjectId, ObjectId>,
    pending: &mut VecDeque<ObjectId>,
    obj: &Object,
) -> Object {
    match obj {
        Object::Reference(source_id) => {
            let target_id = match map.get(source_id) {
                Some(&id) => id,
                None => {
                    let id = target.new_object_id();
                    map.insert(*source_id, id);
                    pending.push_back(*source_id);
                    id
                }
            };
            Object::Reference(target_id)
        }
        Object::Dictionary(dict) => Object::Dictionary(remap_dict(target, map, pending, dict)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| remap(target, map, pending, item))
                .collect(),
        ),
        Object::Stream(stream) => {
            let mut copy = stream.clone();
            copy.dict = remap_dict(target, map, pending, &stream.dict);
            Object::Stream(copy)
        }
        other => other.clone(),
    }
}

fn remap_dict(
    target: &mut Document,
    map: &mut HashMap<ObjectId, ObjectId>,
    pending: &mut VecDeque<ObjectId>,
    dict: &Dictionary,
) -> Dictionary {
    let mut copy = Dictionary::new();
    for (key, value) in dict.iter() {
        copy.set(key.clone(), remap(target, map, pending, value));
    }
    copy
}
