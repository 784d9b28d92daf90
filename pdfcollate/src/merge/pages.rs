//! Output page tree assembly.
//!
//! [`OutputBuilder`] owns the document being assembled. Pages are appended one
//! at a time as structural copies of source pages:
//! - The page dictionary is cloned without `/Parent`
//! - Attributes inherited from the source page tree are pinned on the copy
//! - Everything reachable from the page is imported with fresh object ids
//!
//! The output page tree is flat: one `/Pages` node whose kids are the
//! appended pages in append order.

use crate::error::{PdfCollateError, Result};
use crate::utils::import_object;
use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use std::collections::{HashMap, HashSet};

/// PDF version of the merged document.
pub const OUTPUT_VERSION: &str = "1.7";

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Resolve inheritable attributes missing from `page` by walking its parents.
///
/// Returns `(key, value)` pairs for attributes the page does not declare
/// itself, taken from the nearest ancestor that does.
pub fn inherited_attributes(source: &Document, page: &Dictionary) -> Vec<(Vec<u8>, Object)> {
    let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut parent = page.get(b"Parent").and_then(|p| p.as_reference()).ok();

    while let Some(parent_id) = parent {
        if missing.is_empty() || !visited.insert(parent_id) {
            break;
        }
        let Ok(node) = source.get_dictionary(parent_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }

    found
}

/// Builder for the merged document.
#[derive(Debug)]
pub struct OutputBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    placed: HashSet<ObjectId>,
}

impl OutputBuilder {
    /// Create a builder holding an empty document.
    pub fn new() -> Self {
        let mut doc = Document::with_version(OUTPUT_VERSION);
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            placed: HashSet::new(),
        }
    }

    /// Append a copy of `source_page` at the end of the output.
    ///
    /// `imported` is the source-to-output id map of `source`; reusing it across
    /// pages of the same source copies shared fonts and images only once.
    ///
    /// # Errors
    ///
    /// Returns an error if `source_page` is not a page dictionary.
    pub fn append_page(
        &mut self,
        source: &Document,
        source_page: ObjectId,
        imported: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<ObjectId> {
        let page = source.get_dictionary(source_page).map_err(|e| {
            PdfCollateError::merge_failed(format!("Failed to read page {source_page:?}: {e}"))
        })?;

        let mut copy = page.clone();
        for (key, value) in inherited_attributes(source, page) {
            copy.set(key, value);
        }
        copy.remove(b"Parent");

        // A link annotation copied earlier may already have reserved this
        // page's id. Reuse it once; a second copy of the same page gets its own.
        let page_id = match imported.get(&source_page) {
            Some(&id) if !self.placed.contains(&id) => id,
            Some(_) => self.doc.new_object_id(),
            None => {
                let id = self.doc.new_object_id();
                imported.insert(source_page, id);
                id
            }
        };

        let mut copied = import_object(&mut self.doc, source, imported, &Object::Dictionary(copy));
        if let Object::Dictionary(dict) = &mut copied {
            dict.set("Parent", Object::Reference(self.pages_id));
        }

        self.doc.objects.insert(page_id, copied);
        self.placed.insert(page_id);
        self.kids.push(Object::Reference(page_id));

        Ok(page_id)
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Close the page tree and return the assembled document.
    pub fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.doc
    }
}

impl Default for OutputBuilder {
    fn default() -> Self {
        Self::new()
    }
}
