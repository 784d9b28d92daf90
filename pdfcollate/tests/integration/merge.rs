//! Integration tests for merge jobs: snapshots, cancellation, progress and
//! output structure.

use std::collections::HashMap;

use lopdf::{Document, Object};
use pdfcollate::collection::{CollectionSnapshot, PageIndex};
use pdfcollate::config::{CompressionLevel, Metadata, MergeOptions};
use pdfcollate::io::PdfWriter;
use pdfcollate::merge::{Merger, ProgressTracker};
use pdfcollate::{MergeProgress, PageCollection, PdfCollateError};
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use crate::common::{page_texts, sample_pdf, temp_dir, x_and_y};

/// Collection large enough that a merge yields many times before finishing.
fn large_collection() -> PageCollection {
    let mut collection = PageCollection::default();
    for label in ["A", "B", "C"] {
        collection
            .upload(sample_pdf(label, 25), format!("{label}.pdf"))
            .unwrap();
    }
    collection
}

#[tokio::test]
async fn test_merge_is_deterministic() {
    let (mut collection, _, y) = x_and_y();
    collection.reorder(y[1].id, 1);

    let first = collection.merge().await.unwrap();
    let second = collection.merge().await.unwrap();

    assert_eq!(first.bytes, second.bytes);
}

#[tokio::test]
async fn test_edits_after_begin_do_not_reach_job() {
    let (mut collection, x, y) = x_and_y();

    let job = collection.begin_merge().unwrap();
    collection.delete_one(x[0].id);
    collection.reorder(y[1].id, 0);
    collection.remove_document(y[0].source_document_id);

    let output = job.run().await.unwrap();
    assert_eq!(
        page_texts(&output.bytes),
        ["X page 1", "X page 2", "X page 3", "Y page 1", "Y page 2"]
    );
    assert_eq!(collection.page_count(), 2);
}

#[tokio::test]
async fn test_cancel_before_run() {
    let (collection, _, _) = x_and_y();
    let before = collection.pages().to_vec();

    let job = collection.begin_merge().unwrap();
    job.cancel();
    let err = job.run().await.unwrap_err();

    assert!(matches!(err, PdfCollateError::Cancelled));
    assert_eq!(collection.progress_state(), MergeProgress::Idle);
    assert_eq!(collection.pages(), before.as_slice());
    assert!(!collection.is_merging());
}

#[tokio::test]
async fn test_cancel_during_merge() {
    let collection = large_collection();
    let before = collection.pages().to_vec();
    let mut progress = collection.progress();

    let job = collection.begin_merge().unwrap();
    let token = job.cancellation_token();
    let handle = tokio::spawn(job.run());

    // Cancel as soon as the job reports that pages are being processed.
    while progress.changed().await.is_ok() {
        let state = progress.borrow_and_update().clone();
        assert!(!state.is_terminal(), "merge finished before cancel: {state}");
        if matches!(state, MergeProgress::Processing { .. }) {
            token.cancel();
            break;
        }
    }

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, PdfCollateError::Cancelled));
    assert_eq!(collection.progress_state(), MergeProgress::Idle);
    assert_eq!(collection.pages(), before.as_slice());

    // A cancelled merge can be retried.
    let output = collection.merge().await.unwrap();
    assert_eq!(output.statistics.pages_written, 75);
}

#[tokio::test]
async fn test_progress_reaches_complete() {
    let (collection, _, _) = x_and_y();
    let mut progress = collection.progress();

    let job = collection.begin_merge().unwrap();
    let handle = tokio::spawn(job.run());

    let mut seen = Vec::new();
    while progress.changed().await.is_ok() {
        let state = progress.borrow_and_update().clone();
        let done = state.is_terminal();
        seen.push(state);
        if done {
            break;
        }
    }
    handle.await.unwrap().unwrap();

    let percents: Vec<u8> = seen.iter().filter_map(MergeProgress::percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert!(matches!(seen.last(), Some(MergeProgress::Complete { .. })));

    collection.reset_progress();
    assert_eq!(collection.progress_state(), MergeProgress::Idle);
}

#[tokio::test]
async fn test_failed_merge_is_retryable() {
    let mut collection = PageCollection::default();

    let err = collection.merge().await.unwrap_err();
    assert!(matches!(err, PdfCollateError::NothingToMerge));
    assert!(matches!(
        collection.progress_state(),
        MergeProgress::Error { .. }
    ));

    collection.upload(sample_pdf("A", 2), "a.pdf").unwrap();
    let output = collection.merge().await.unwrap();
    assert_eq!(page_texts(&output.bytes), ["A page 1", "A page 2"]);
    assert!(matches!(
        collection.progress_state(),
        MergeProgress::Complete { .. }
    ));
}

#[tokio::test]
async fn test_snapshot_without_sources_fails() {
    let (collection, x, _) = x_and_y();
    let mut index = PageIndex::new();
    index.append(x[0].source_document_id, 2);
    let snapshot = CollectionSnapshot::new(index.pages(), HashMap::new());

    let tracker = ProgressTracker::new();
    let err = Merger::new(collection.options().clone())
        .merge(&snapshot, &CancellationToken::new(), &tracker)
        .await
        .unwrap_err();

    assert!(matches!(err, PdfCollateError::MissingSource { .. }));
    assert!(matches!(tracker.current(), MergeProgress::Error { .. }));
}

#[tokio::test]
async fn test_inherited_attributes_are_pinned() {
    let (collection, _, _) = x_and_y();
    let output = collection.merge().await.unwrap();

    let merged = Document::load_mem(&output.bytes).unwrap();
    for page_id in merged.get_pages().into_values() {
        let page = merged.get_dictionary(page_id).unwrap();

        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let values: Vec<f32> = media_box.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(values, [0.0, 0.0, 612.0, 792.0]);
        assert!(page.has(b"Resources"));

        let parent = page.get(b"Parent").unwrap().as_reference().unwrap();
        let parent = merged.get_dictionary(parent).unwrap();
        assert!(matches!(parent.get(b"Type"), Ok(Object::Name(name)) if name == b"Pages"));
    }
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_compression_levels_keep_pages(#[case] compression: CompressionLevel) {
    let (mut collection, _, _) = x_and_y();
    collection.set_options(MergeOptions {
        compression,
        ..MergeOptions::default()
    });

    let output = collection.merge().await.unwrap();
    assert_eq!(output.statistics.compression, compression);
    assert_eq!(page_texts(&output.bytes).len(), 5);
}

#[tokio::test]
async fn test_merge_and_save() {
    let (mut collection, _, _) = x_and_y();
    collection.set_options(MergeOptions {
        metadata: Metadata::new(
            Some("Combined".to_string()),
            Some("Tests".to_string()),
            None,
            None,
        ),
        ..MergeOptions::default()
    });

    let output = collection.merge().await.unwrap();
    let dir = temp_dir();
    let path = dir.path().join(&collection.options().file_name);

    let stats = PdfWriter::new().save_bytes(&output.bytes, &path).await.unwrap();
    assert_eq!(stats.file_size, output.bytes.len() as u64);

    let saved = tokio::fs::read(&path).await.unwrap();
    assert_eq!(page_texts(&saved).len(), 5);

    let doc = Document::load_mem(&saved).unwrap();
    let info = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info).unwrap();
    assert!(matches!(info.get(b"Title"), Ok(Object::String(title, _)) if title == b"Combined"));
}
