//! Immutable views of a collection, captured for a merge.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{DocumentId, Page, SourceDocument};

/// Page order and source documents frozen at one point in time.
///
/// Cloning is cheap: both the page list and the document map are shared, and
/// document content is never copied.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    pages: Arc<[Page]>,
    documents: Arc<HashMap<DocumentId, SourceDocument>>,
}

impl CollectionSnapshot {
    /// Build a snapshot from a page order and the documents it refers to.
    pub fn new(
        pages: impl Into<Arc<[Page]>>,
        documents: HashMap<DocumentId, SourceDocument>,
    ) -> Self {
        Self {
            pages: pages.into(),
            documents: Arc::new(documents),
        }
    }

    /// Pages in merge order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Look up a document.
    pub fn document(&self, id: DocumentId) -> Option<&SourceDocument> {
        self.documents.get(&id)
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check whether there are no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of distinct documents the pages refer to.
    pub fn distinct_documents(&self) -> usize {
        self.pages
            .iter()
            .map(|page| page.source_document_id)
            .collect::<HashSet<_>>()
            .len()
    }
}
