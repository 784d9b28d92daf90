//! The ordered page sequence.
//!
//! [`PageIndex`] is the single source of truth for output order: the merge
//! writes pages exactly in the order they sit here. Pages keep their identity
//! for their whole life; moving one only changes its position.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::DocumentId;

/// Collection-unique identifier of a page. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(u64);

impl PageId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// A reference to one page of one source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page id.
    pub id: PageId,
    /// Document the page is taken from.
    pub source_document_id: DocumentId,
    /// 1-based page number inside the source document.
    pub source_page_number: u32,
}

/// Ordered sequence of pages.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    pages: Vec<Page>,
    next_id: u64,
}

impl PageIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `page_count` pages of a document, numbered `1..=page_count`.
    ///
    /// Returns the created pages in the order they were appended.
    pub fn append(&mut self, source_document_id: DocumentId, page_count: u32) -> Vec<Page> {
        let created: Vec<Page> = (1..=page_count)
            .map(|source_page_number| {
                self.next_id += 1;
                Page {
                    id: PageId(self.next_id),
                    source_document_id,
                    source_page_number,
                }
            })
            .collect();

        self.pages.extend_from_slice(&created);
        created
    }

    /// Move a page to `new_position`, clamped to the valid range.
    ///
    /// Pages between the old and new position shift by one; every other page
    /// keeps its place. Returns `false` when nothing moved: the id is absent
    /// or the page already sits at the target position.
    pub fn reorder(&mut self, page_id: PageId, new_position: usize) -> bool {
        let Some(current) = self.position(page_id) else {
            return false;
        };

        let target = new_position.min(self.pages.len() - 1);
        if target == current {
            return false;
        }

        let page = self.pages.remove(current);
        self.pages.insert(target, page);
        true
    }

    /// Remove a page. Absent ids are ignored.
    pub fn delete_one(&mut self, page_id: PageId) -> Option<Page> {
        let position = self.position(page_id)?;
        Some(self.pages.remove(position))
    }

    /// Remove every page whose id is in `ids` in a single pass.
    ///
    /// Survivors keep their relative order. Returns the removed pages.
    pub fn delete_many<I>(&mut self, ids: I) -> Vec<Page>
    where
        I: IntoIterator<Item = PageId>,
    {
        let ids: HashSet<PageId> = ids.into_iter().collect();
        if ids.is_empty() {
            return Vec::new();
        }
        self.remove_where(|page| ids.contains(&page.id))
    }

    /// Remove every page taken from `source_document_id`.
    pub fn delete_document(&mut self, source_document_id: DocumentId) -> Vec<Page> {
        self.remove_where(|page| page.source_document_id == source_document_id)
    }

    fn remove_where<F>(&mut self, mut predicate: F) -> Vec<Page>
    where
        F: FnMut(&Page) -> bool,
    {
        let (removed, kept): (Vec<Page>, Vec<Page>) = std::mem::take(&mut self.pages)
            .into_iter()
            .partition(|page| predicate(page));
        self.pages = kept;
        removed
    }

    /// Current position of a page.
    pub fn position(&self, page_id: PageId) -> Option<usize> {
        self.pages.iter().position(|page| page.id == page_id)
    }

    /// Look up a page by id.
    pub fn get(&self, page_id: PageId) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == page_id)
    }

    /// Look up a page by its source coordinates.
    pub fn find(&self, source_document_id: DocumentId, source_page_number: u32) -> Option<&Page> {
        self.pages.iter().find(|page| {
            page.source_document_id == source_document_id
                && page.source_page_number == source_page_number
        })
    }

    /// Check whether a page is present.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.position(page_id).is_some()
    }

    /// Pages in output order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page ids in output order.
    pub fn ids(&self) -> Vec<PageId> {
        self.pages.iter().map(|page| page.id).collect()
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
