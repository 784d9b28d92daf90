//! Core merge implementation.
//!
//! [`Merger::merge`] turns a [`CollectionSnapshot`] into the bytes of one
//! PDF. It walks the snapshot's pages in order, parses each referenced source
//! document at most once, appends a structural copy of every page to an
//! [`OutputBuilder`] and serializes the result.
//!
//! The merge yields to the runtime after every page and runs parsing and
//! serialization on the blocking pool. Each of those points is also a
//! cancellation checkpoint.

use lopdf::Document;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::collection::{CollectionSnapshot, SourceDocument};
use crate::config::{CompressionLevel, MergeOptions};
use crate::error::{PdfCollateError, Result};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::cache::ParseCache;
use crate::merge::metadata::MetadataManager;
use crate::merge::pages::OutputBuilder;
use crate::merge::progress::{MergeProgress, ProgressTracker, SERIALIZE_PERCENT, scaled_percent};
use crate::utils::format_file_size;

/// Statistics about a merge operation.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of pages in the merged document.
    pub pages_written: usize,

    /// Number of distinct source documents parsed.
    pub documents_parsed: usize,

    /// Size of the merged document in bytes.
    pub output_size: u64,

    /// Time spent parsing source documents.
    pub parse_time: Duration,

    /// Total time taken for the merge.
    pub merge_time: Duration,

    /// Compression applied to the output.
    pub compression: CompressionLevel,
}

impl MergeStatistics {
    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of a merge operation.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The merged PDF.
    pub bytes: Vec<u8>,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// PDF merger.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    /// Reader used to parse source documents.
    reader: PdfReader,

    /// Metadata manager for the output Info dictionary.
    metadata_manager: MetadataManager,

    /// Output options.
    options: MergeOptions,
}

impl Merger {
    /// Create a merger producing output with `options`.
    pub fn new(options: MergeOptions) -> Self {
        Self {
            reader: PdfReader::new(),
            metadata_manager: MetadataManager::new(),
            options,
        }
    }

    /// Output options of this merger.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge the pages of `snapshot`, in order, into one PDF.
    ///
    /// Progress is published on `progress`: `Loading` while preparing,
    /// `Processing` as documents are parsed and pages copied, then `Complete`
    /// or `Error`. A cancelled merge returns the tracker to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The snapshot has no pages
    /// - A page references a document missing from the snapshot, or a page
    ///   number the document does not have
    /// - `cancel` fires before the merge completes
    /// - A source document cannot be parsed or the output cannot be written
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfcollate::collection::CollectionSnapshot;
    /// # use pdfcollate::merge::{Merger, ProgressTracker};
    /// # use pdfcollate::config::MergeOptions;
    /// # use tokio_util::sync::CancellationToken;
    /// # async fn example(snapshot: CollectionSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    /// let merger = Merger::new(MergeOptions::default());
    /// let output = merger
    ///     .merge(&snapshot, &CancellationToken::new(), &ProgressTracker::new())
    ///     .await?;
    /// println!("Merged {} pages", output.statistics.pages_written);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge(
        &self,
        snapshot: &CollectionSnapshot,
        cancel: &CancellationToken,
        progress: &ProgressTracker,
    ) -> Result<MergeOutput> {
        let result = self.merge_pages(snapshot, cancel, progress).await;

        match &result {
            Ok(output) => {
                tracing::info!(
                    pages = output.statistics.pages_written,
                    documents = output.statistics.documents_parsed,
                    size = output.statistics.output_size,
                    elapsed_ms = output.statistics.merge_time.as_millis() as u64,
                    "Merge complete"
                );
                progress.set(MergeProgress::complete(format!(
                    "Merged {} page(s) ({})",
                    output.statistics.pages_written,
                    output.statistics.format_output_size()
                )));
            }
            Err(PdfCollateError::Cancelled) => {
                tracing::info!("Merge cancelled");
                progress.reset();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Merge failed");
                progress.set(MergeProgress::error(e.to_string()));
            }
        }

        result
    }

    async fn merge_pages(
        &self,
        snapshot: &CollectionSnapshot,
        cancel: &CancellationToken,
        progress: &ProgressTracker,
    ) -> Result<MergeOutput> {
        let merge_start = Instant::now();
        checkpoint(cancel)?;

        progress.set(MergeProgress::loading("Preparing merge...", 0));
        if snapshot.is_empty() {
            return Err(PdfCollateError::NothingToMerge);
        }

        let total_steps = snapshot.distinct_documents() + snapshot.len();
        let mut steps_done = 0;
        let mut cache = ParseCache::new();
        let mut builder = OutputBuilder::new();
        let mut parse_time = Duration::ZERO;

        tracing::debug!(pages = snapshot.len(), "Starting merge");

        for page in snapshot.pages() {
            checkpoint(cancel)?;

            let missing = || PdfCollateError::MissingSource {
                page: page.id,
                document: page.source_document_id,
            };
            let source = snapshot.document(page.source_document_id).ok_or_else(missing)?;

            if !cache.contains(source.id()) {
                let parse_start = Instant::now();
                let document = self.parse(source, cancel).await?;
                parse_time += parse_start.elapsed();
                cache.insert(source.id(), document);

                steps_done += 1;
                progress.set(MergeProgress::processing(
                    format!("Processing {}...", source.name()),
                    scaled_percent(steps_done, total_steps),
                ));
            }

            let parsed = cache.get_mut(source.id()).ok_or_else(missing)?;
            let page_object = parsed
                .page_object(page.source_page_number)
                .ok_or_else(missing)?;
            let (document, imported) = parsed.parts_mut();
            builder.append_page(document, page_object, imported)?;

            steps_done += 1;
            progress.set(MergeProgress::processing(
                format!("Copied page {} of {}", builder.page_count(), snapshot.len()),
                scaled_percent(steps_done, total_steps),
            ));

            tokio::task::yield_now().await;
        }

        checkpoint(cancel)?;
        progress.set(MergeProgress::processing(
            "Preparing download...",
            SERIALIZE_PERCENT,
        ));

        let pages_written = builder.page_count();
        let documents_parsed = cache.len();
        drop(cache);

        let mut document = builder.finish();
        self.metadata_manager
            .set_metadata(&mut document, &self.options.metadata);

        let bytes = self.serialize(document, cancel).await?;

        Ok(MergeOutput {
            statistics: MergeStatistics {
                pages_written,
                documents_parsed,
                output_size: bytes.len() as u64,
                parse_time,
                merge_time: merge_start.elapsed(),
                compression: self.options.compression,
            },
            bytes,
        })
    }

    /// Parse one source document on the blocking pool.
    async fn parse(&self, source: &SourceDocument, cancel: &CancellationToken) -> Result<Document> {
        let reader = self.reader;
        let name = source.name().to_string();
        let content = source.shared_content();

        tracing::debug!(document = %source.id(), name = %name, "Parsing source document");

        let task = tokio::task::spawn_blocking(move || reader.parse(&name, &content));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PdfCollateError::Cancelled),
            joined = task => joined
                .map_err(|e| PdfCollateError::merge_failed(format!("Parse task failed: {e}")))?,
        }
    }

    /// Serialize the assembled document on the blocking pool.
    async fn serialize(&self, document: Document, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let compression = self.options.compression;
        let task = tokio::task::spawn_blocking(move || PdfWriter::serialize(document, compression));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PdfCollateError::Cancelled),
            joined = task => joined
                .map_err(|e| PdfCollateError::merge_failed(format!("Serialize task failed: {e}")))?,
        }
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(PdfCollateError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{DocumentId, Page, PageId};
    use crate::config::Metadata;
    use crate::test_support::{page_texts, sample_pdf};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn source(id: u64, label: &str, pages: u32) -> SourceDocument {
        let bytes = sample_pdf(label, pages as usize);
        SourceDocument::new(
            DocumentId::new(id),
            format!("{label}.pdf"),
            Arc::from(bytes),
            pages,
            "1.5".to_string(),
            Some((612.0, 792.0)),
        )
    }

    fn page(id: u64, document: u64, number: u32) -> Page {
        Page {
            id: PageId::new(id),
            source_document_id: DocumentId::new(document),
            source_page_number: number,
        }
    }

    fn snapshot(documents: Vec<SourceDocument>, pages: Vec<Page>) -> CollectionSnapshot {
        let documents: HashMap<DocumentId, SourceDocument> =
            documents.into_iter().map(|d| (d.id(), d)).collect();
        CollectionSnapshot::new(pages, documents)
    }

    async fn run(snapshot: &CollectionSnapshot) -> Result<MergeOutput> {
        Merger::default()
            .merge(snapshot, &CancellationToken::new(), &ProgressTracker::new())
            .await
    }

    #[tokio::test]
    async fn test_merge_interleaved_pages() {
        let snap = snapshot(
            vec![source(1, "x", 3), source(2, "y", 2)],
            vec![page(4, 2, 1), page(1, 1, 1), page(3, 1, 3), page(5, 2, 2)],
        );

        let output = run(&snap).await.unwrap();
        assert_eq!(output.statistics.pages_written, 4);
        assert_eq!(output.statistics.documents_parsed, 2);
        assert_eq!(output.statistics.output_size, output.bytes.len() as u64);

        let merged = Document::load_mem(&output.bytes).unwrap();
        assert_eq!(
            page_texts(&merged),
            vec!["y page 1", "x page 1", "x page 3", "y page 2"]
        );
    }

    #[tokio::test]
    async fn test_merge_empty_snapshot() {
        let tracker = ProgressTracker::new();
        let err = Merger::default()
            .merge(&snapshot(vec![], vec![]), &CancellationToken::new(), &tracker)
            .await
            .unwrap_err();

        assert!(matches!(err, PdfCollateError::NothingToMerge));
        assert!(matches!(tracker.current(), MergeProgress::Error { .. }));
    }

    #[tokio::test]
    async fn test_merge_missing_document() {
        let snap = snapshot(vec![source(1, "x", 1)], vec![page(1, 1, 1), page(2, 9, 1)]);

        let err = run(&snap).await.unwrap_err();
        match err {
            PdfCollateError::MissingSource { page, document } => {
                assert_eq!(page, PageId::new(2));
                assert_eq!(document, DocumentId::new(9));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_merge_page_number_out_of_range() {
        let snap = snapshot(vec![source(1, "x", 2)], vec![page(1, 1, 3)]);

        let err = run(&snap).await.unwrap_err();
        assert!(matches!(err, PdfCollateError::MissingSource { .. }));
    }

    #[tokio::test]
    async fn test_merge_is_deterministic() {
        let snap = snapshot(
            vec![source(1, "x", 2), source(2, "y", 2)],
            vec![page(1, 1, 2), page(2, 2, 1), page(3, 1, 1)],
        );

        let first = run(&snap).await.unwrap();
        let second = run(&snap).await.unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let snap = snapshot(vec![source(1, "x", 1)], vec![page(1, 1, 1)]);
        let tracker = ProgressTracker::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = Merger::default()
            .merge(&snap, &cancel, &tracker)
            .await
            .unwrap_err();

        assert!(matches!(err, PdfCollateError::Cancelled));
        assert_eq!(tracker.current(), MergeProgress::Idle);
    }

    #[tokio::test]
    async fn test_progress_ends_complete() {
        let snap = snapshot(vec![source(1, "x", 2)], vec![page(1, 1, 1), page(2, 1, 2)]);
        let tracker = ProgressTracker::new();

        Merger::default()
            .merge(&snap, &CancellationToken::new(), &tracker)
            .await
            .unwrap();

        assert!(matches!(tracker.current(), MergeProgress::Complete { .. }));
    }

    #[tokio::test]
    async fn test_merge_writes_metadata() {
        let snap = snapshot(vec![source(1, "x", 1)], vec![page(1, 1, 1)]);
        let options = MergeOptions {
            compression: CompressionLevel::Standard,
            metadata: Metadata::new(Some("Bundle".to_string()), None, None, None),
            ..MergeOptions::default()
        };

        let output = Merger::new(options)
            .merge(&snap, &CancellationToken::new(), &ProgressTracker::new())
            .await
            .unwrap();

        let merged = Document::load_mem(&output.bytes).unwrap();
        let metadata = MetadataManager::new().get_metadata(&merged);
        assert_eq!(metadata.title.as_deref(), Some("Bundle"));
        assert_eq!(output.statistics.compression, CompressionLevel::Standard);
    }
}
