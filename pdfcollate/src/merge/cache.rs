//! Per-merge parse cache.

use lopdf::{Document, ObjectId};
use std::collections::{BTreeMap, HashMap};

use crate::collection::DocumentId;

/// A source document parsed for one merge, plus its object id mapping into
/// the output.
#[derive(Debug)]
pub struct ParsedSource {
    document: Document,
    pages: BTreeMap<u32, ObjectId>,
    imported: HashMap<ObjectId, ObjectId>,
}

impl ParsedSource {
    /// Wrap a parsed document.
    pub fn new(document: Document) -> Self {
        let pages = document.get_pages();
        Self {
            document,
            pages,
            imported: HashMap::new(),
        }
    }

    /// Object id of the 1-based page `number`.
    pub fn page_object(&self, number: u32) -> Option<ObjectId> {
        self.pages.get(&number).copied()
    }

    /// Number of pages in the parsed document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Parsed document and the source-to-output id map, borrowed together.
    pub fn parts_mut(&mut self) -> (&Document, &mut HashMap<ObjectId, ObjectId>) {
        (&self.document, &mut self.imported)
    }
}

/// Parsed documents of one merge, keyed by document id.
///
/// Each document is parsed at most once per merge. The cache is dropped with
/// the merge, so nothing outlives a cancelled or failed run.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: HashMap<DocumentId, ParsedSource>,
}

impl ParseCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `id` has been parsed.
    pub fn contains(&self, id: DocumentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Store a parsed document.
    pub fn insert(&mut self, id: DocumentId, document: Document) {
        self.entries.insert(id, ParsedSource::new(document));
    }

    /// Parsed document for `id`.
    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut ParsedSource> {
        self.entries.get_mut(&id)
    }

    /// Number of parsed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing has been parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
