//! The page collection: uploaded documents, page order and selection.
//!
//! [`PageCollection`] owns the three mutable parts of a session and keeps them
//! consistent with each other:
//! - Removing a document removes all of its pages in the same call
//! - Any page removal prunes the selection before returning
//! - Merges run on a [`CollectionSnapshot`], so later edits never reach them
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::PageCollection;
//! use pdfcollate::config::{Limits, MergeOptions};
//!
//! # async fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut collection = PageCollection::new(Limits::default(), MergeOptions::default());
//! let (_, a_pages) = collection.upload(a, "a.pdf")?;
//! let (_, b_pages) = collection.upload(b, "b.pdf")?;
//!
//! // Put the first page of b.pdf in front and drop the last page of a.pdf.
//! collection.reorder(b_pages[0].id, 0);
//! if let Some(last) = a_pages.last() {
//!     collection.delete_one(last.id);
//! }
//!
//! let output = collection.merge().await?;
//! std::fs::write("merged-document.pdf", &output.bytes)?;
//! # Ok(())
//! # }
//! ```

mod document;
mod edit;
mod page_index;
mod registry;
mod selection;
mod snapshot;

pub use document::{DocumentId, SourceDocument};
pub use page_index::{Page, PageId, PageIndex};
pub use registry::UploadRegistry;
pub use selection::SelectionSet;
pub use snapshot::CollectionSnapshot;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use crate::config::{Limits, MergeOptions};
use crate::error::{PdfCollateError, Result};
use crate::merge::job::InFlightGuard;
use crate::merge::{MergeJob, MergeOutput, MergeProgress, Merger, ProgressTracker};
use crate::renderer::{PageRenderer, Thumbnail};

/// An upload that was turned away.
#[derive(Debug)]
pub struct RejectedUpload {
    /// Name of the upload.
    pub name: String,
    /// Why it was rejected.
    pub error: PdfCollateError,
}

/// Outcome of [`PageCollection::upload_batch`].
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Accepted documents with the pages appended for them, in input order.
    pub accepted: Vec<(SourceDocument, Vec<Page>)>,
    /// Rejected uploads, in input order.
    pub rejected: Vec<RejectedUpload>,
}

impl UploadReport {
    /// Total number of pages appended.
    pub fn pages_added(&self) -> usize {
        self.accepted.iter().map(|(_, pages)| pages.len()).sum()
    }

    /// Check whether every upload was accepted.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Uploaded documents, their pages in output order, and the page selection.
#[derive(Debug)]
pub struct PageCollection {
    registry: UploadRegistry,
    index: PageIndex,
    selection: SelectionSet,
    options: MergeOptions,
    in_flight: Arc<AtomicBool>,
    progress: ProgressTracker,
}

impl PageCollection {
    /// Create an empty collection.
    pub fn new(limits: Limits, options: MergeOptions) -> Self {
        Self {
            registry: UploadRegistry::new(limits),
            index: PageIndex::new(),
            selection: SelectionSet::new(),
            options,
            in_flight: Arc::new(AtomicBool::new(false)),
            progress: ProgressTracker::new(),
        }
    }

    /// Validate and register a document without creating pages.
    ///
    /// # Errors
    ///
    /// See [`UploadRegistry::add_document`].
    pub fn add_document(
        &mut self,
        bytes: Vec<u8>,
        name: impl Into<String>,
    ) -> Result<SourceDocument> {
        self.registry.add_document(bytes, name)
    }

    /// Remove a document together with all of its pages.
    ///
    /// Absent ids are ignored.
    pub fn remove_document(&mut self, id: DocumentId) -> Option<SourceDocument> {
        let removed = self.registry.remove_document(id)?;
        let pages = self.index.delete_document(id);
        self.selection.prune(&self.index);
        tracing::debug!(document = %id, pages = pages.len(), "Cascaded document removal");
        Some(removed)
    }

    /// Append pages `1..=page_count` of a registered document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is unknown or has fewer than
    /// `page_count` pages.
    pub fn append_pages(&mut self, id: DocumentId, page_count: u32) -> Result<Vec<Page>> {
        let document = self
            .registry
            .get(id)
            .ok_or(PdfCollateError::UnknownDocument { id })?;

        if page_count > document.page_count() {
            return Err(PdfCollateError::InvalidPageCount {
                document: id,
                requested: page_count,
                available: document.page_count(),
            });
        }

        Ok(self.index.append(id, page_count))
    }

    /// Register a document and append all of its pages.
    ///
    /// # Errors
    ///
    /// See [`UploadRegistry::add_document`].
    pub fn upload(
        &mut self,
        bytes: Vec<u8>,
        name: impl Into<String>,
    ) -> Result<(SourceDocument, Vec<Page>)> {
        let document = self.add_document(bytes, name)?;
        let pages = self.index.append(document.id(), document.page_count());
        Ok((document, pages))
    }

    /// Upload several files, keeping the ones that pass validation.
    ///
    /// Every upload is attempted; a rejection never affects the others.
    pub fn upload_batch<I, S>(&mut self, uploads: I) -> UploadReport
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut report = UploadReport::default();

        for (name, bytes) in uploads {
            let name = name.into();
            match self.upload(bytes, name.clone()) {
                Ok(accepted) => report.accepted.push(accepted),
                Err(error) => {
                    tracing::warn!(name = %name, error = %error, "Rejected upload");
                    report.rejected.push(RejectedUpload { name, error });
                }
            }
        }

        report
    }

    /// Move a page to `new_position`, clamped to the valid range.
    ///
    /// Returns whether anything moved.
    pub fn reorder(&mut self, page_id: PageId, new_position: usize) -> bool {
        self.index.reorder(page_id, new_position)
    }

    /// Remove one page. Absent ids are ignored.
    pub fn delete_one(&mut self, page_id: PageId) -> Option<Page> {
        let removed = self.index.delete_one(page_id)?;
        self.selection.prune(&self.index);
        Some(removed)
    }

    /// Remove every listed page in one step.
    pub fn delete_many<I>(&mut self, ids: I) -> Vec<Page>
    where
        I: IntoIterator<Item = PageId>,
    {
        let removed = self.index.delete_many(ids);
        if !removed.is_empty() {
            self.selection.prune(&self.index);
        }
        removed
    }

    /// Flip the selection state of a page.
    ///
    /// Returns whether the page is now selected. Ids not in the collection
    /// are ignored.
    pub fn toggle_select(&mut self, page_id: PageId) -> bool {
        if !self.index.contains(page_id) {
            return false;
        }
        self.selection.toggle(page_id)
    }

    /// Select every page.
    pub fn select_all(&mut self) {
        self.selection.select_all(&self.index);
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Remove every selected page and clear the selection.
    pub fn delete_selected(&mut self) -> Vec<Page> {
        let selected = self.selection.take();
        self.index.delete_many(selected)
    }

    /// Check whether a page is selected.
    pub fn is_selected(&self, page_id: PageId) -> bool {
        self.selection.contains(page_id)
    }

    /// Pages in output order.
    pub fn pages(&self) -> &[Page] {
        self.index.pages()
    }

    /// Look up a page.
    pub fn page(&self, page_id: PageId) -> Option<&Page> {
        self.index.get(page_id)
    }

    /// Current position of a page.
    pub fn position(&self, page_id: PageId) -> Option<usize> {
        self.index.position(page_id)
    }

    /// Look up a page by its source coordinates.
    pub fn find_page(&self, id: DocumentId, source_page_number: u32) -> Option<&Page> {
        self.index.find(id, source_page_number)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.index.len()
    }

    /// Check whether there are no pages.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Registered documents in upload order.
    pub fn documents(&self) -> impl Iterator<Item = &SourceDocument> {
        self.registry.iter()
    }

    /// Look up a document.
    pub fn document(&self, id: DocumentId) -> Option<&SourceDocument> {
        self.registry.get(id)
    }

    /// The upload registry.
    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Output options used by future merges.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Replace the output options used by future merges.
    pub fn set_options(&mut self, options: MergeOptions) {
        self.options = options;
    }

    /// Freeze the current page order and documents.
    pub fn snapshot(&self) -> CollectionSnapshot {
        let documents: HashMap<DocumentId, SourceDocument> = self
            .registry
            .iter()
            .map(|doc| (doc.id(), doc.clone()))
            .collect();
        CollectionSnapshot::new(self.index.pages(), documents)
    }

    /// Capture a snapshot and prepare a merge of it.
    ///
    /// # Errors
    ///
    /// Returns [`PdfCollateError::Busy`] while a previous job is alive.
    pub fn begin_merge(&self) -> Result<MergeJob> {
        let guard = InFlightGuard::acquire(&self.in_flight)?;
        Ok(MergeJob::new(
            self.snapshot(),
            Merger::new(self.options.clone()),
            self.progress.clone(),
            guard,
        ))
    }

    /// Merge the current pages.
    ///
    /// # Errors
    ///
    /// See [`PageCollection::begin_merge`] and [`Merger::merge`].
    pub async fn merge(&self) -> Result<MergeOutput> {
        self.begin_merge()?.run().await
    }

    /// Check whether a merge job is alive.
    pub fn is_merging(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Receiver observing merge progress.
    pub fn progress(&self) -> watch::Receiver<MergeProgress> {
        self.progress.subscribe()
    }

    /// Current merge progress.
    pub fn progress_state(&self) -> MergeProgress {
        self.progress.current()
    }

    /// Return merge progress to `Idle`.
    pub fn reset_progress(&self) {
        self.progress.reset();
    }

    /// Ask `renderer` for a thumbnail of a page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page is unknown or the renderer fails.
    pub fn request_thumbnail<R>(&self, renderer: &R, page_id: PageId) -> Result<Thumbnail>
    where
        R: PageRenderer + ?Sized,
    {
        let page = self
            .index
            .get(page_id)
            .ok_or(PdfCollateError::UnknownPage { id: page_id })?;
        let document =
            self.registry
                .get(page.source_document_id)
                .ok_or(PdfCollateError::MissingSource {
                    page: page.id,
                    document: page.source_document_id,
                })?;
        renderer.request_thumbnail(document, page.source_page_number)
    }
}

impl Default for PageCollection {
    fn default() -> Self {
        Self::new(Limits::default(), MergeOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_pdf;
    use std::cell::Cell;

    fn loaded() -> (PageCollection, DocumentId, DocumentId) {
        let mut collection = PageCollection::default();
        let (x, _) = collection.upload(sample_pdf("x", 3), "x.pdf").unwrap();
        let (y, _) = collection.upload(sample_pdf("y", 2), "y.pdf").unwrap();
        (collection, x.id(), y.id())
    }

    fn page(collection: &PageCollection, doc: DocumentId, number: u32) -> PageId {
        collection.find_page(doc, number).unwrap().id
    }

    #[test]
    fn test_add_document_creates_no_pages() {
        let mut collection = PageCollection::default();
        let doc = collection.add_document(sample_pdf("a", 2), "a.pdf").unwrap();

        assert!(collection.is_empty());
        assert_eq!(collection.append_pages(doc.id(), 2).unwrap().len(), 2);
    }

    #[test]
    fn test_append_pages_validates() {
        let (mut collection, x, _) = loaded();

        assert!(matches!(
            collection.append_pages(DocumentId::new(99), 1),
            Err(PdfCollateError::UnknownDocument { .. })
        ));
        assert!(matches!(
            collection.append_pages(x, 4),
            Err(PdfCollateError::InvalidPageCount {
                requested: 4,
                available: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_remove_document_cascades() {
        let (mut collection, x, y) = loaded();
        let x1 = page(&collection, x, 1);
        let y1 = page(&collection, y, 1);
        collection.toggle_select(x1);
        collection.toggle_select(y1);

        assert!(collection.remove_document(x).is_some());

        assert_eq!(collection.page_count(), 2);
        assert!(collection.pages().iter().all(|p| p.source_document_id == y));
        assert!(!collection.is_selected(x1));
        assert!(collection.is_selected(y1));
        assert!(collection.remove_document(x).is_none());
    }

    #[test]
    fn test_delete_one_prunes_selection() {
        let (mut collection, x, _) = loaded();
        let x2 = page(&collection, x, 2);
        collection.toggle_select(x2);

        collection.delete_one(x2);
        assert!(collection.selection().is_empty());
    }

    #[test]
    fn test_toggle_absent_page_is_noop() {
        let (mut collection, _, _) = loaded();
        assert!(!collection.toggle_select(PageId::new(999)));
        assert!(collection.selection().is_empty());
    }

    #[test]
    fn test_select_all_then_delete_selected() {
        let (mut collection, _, _) = loaded();
        collection.select_all();

        assert_eq!(collection.delete_selected().len(), 5);
        assert!(collection.is_empty());
        assert!(collection.selection().is_empty());
    }

    #[test]
    fn test_upload_batch_partial_success() {
        let mut collection = PageCollection::default();
        let report = collection.upload_batch(vec![
            ("a.pdf", sample_pdf("a", 2)),
            ("broken.pdf", b"%PDF-1.4 garbage".to_vec()),
            ("b.pdf", sample_pdf("b", 1)),
        ]);

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.pages_added(), 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].name, "broken.pdf");
        assert!(!report.is_complete());
        assert_eq!(collection.page_count(), 3);
    }

    #[test]
    fn test_begin_merge_is_exclusive() {
        let (collection, _, _) = loaded();

        let job = collection.begin_merge().unwrap();
        assert!(collection.is_merging());
        assert!(matches!(collection.begin_merge(), Err(PdfCollateError::Busy)));

        drop(job);
        assert!(!collection.is_merging());
        assert!(collection.begin_merge().is_ok());
    }

    struct CountingRenderer {
        calls: Cell<u32>,
    }

    impl PageRenderer for CountingRenderer {
        fn request_thumbnail(&self, document: &SourceDocument, page_number: u32) -> Result<Thumbnail> {
            self.calls.set(self.calls.get() + 1);
            Ok(Thumbnail {
                width: 120,
                height: 160,
                media_type: "image/png".to_string(),
                data: format!("{}#{page_number}", document.name()).into_bytes(),
            })
        }
    }

    #[test]
    fn test_request_thumbnail_delegates() {
        let (collection, _, y) = loaded();
        let renderer = CountingRenderer { calls: Cell::new(0) };

        let thumbnail = collection
            .request_thumbnail(&renderer, page(&collection, y, 2))
            .unwrap();
        assert_eq!(thumbnail.data, b"y.pdf#2".to_vec());
        assert_eq!(renderer.calls.get(), 1);

        assert!(matches!(
            collection.request_thumbnail(&renderer, PageId::new(999)),
            Err(PdfCollateError::UnknownPage { .. })
        ));
        assert_eq!(renderer.calls.get(), 1);
    }
}
