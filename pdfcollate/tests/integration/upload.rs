//! Integration tests for uploads, limits and edit scripts.

use pdfcollate::config::{Edit, Limits, MergeOptions};
use pdfcollate::io::PdfReader;
use pdfcollate::{PageCollection, PdfCollateError};
use rstest::rstest;

use crate::common::{page_texts, sample_pdf, temp_dir};

fn limited(max_file_size: u64, max_documents: usize, max_pages: usize) -> PageCollection {
    PageCollection::new(
        Limits {
            max_file_size,
            max_documents,
            max_pages_per_document: max_pages,
        },
        MergeOptions::default(),
    )
}

#[test]
fn test_batch_keeps_valid_uploads() {
    let mut collection = PageCollection::default();

    let report = collection.upload_batch(vec![
        ("a.pdf", sample_pdf("A", 2)),
        ("notes.txt", b"just some text".to_vec()),
        ("b.pdf", sample_pdf("B", 1)),
    ]);

    assert!(!report.is_complete());
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.pages_added(), 3);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].name, "notes.txt");
    assert!(matches!(
        report.rejected[0].error,
        PdfCollateError::Parse { .. }
    ));

    assert_eq!(collection.page_count(), 3);
    assert_eq!(collection.documents().count(), 2);
}

#[rstest]
#[case::too_large(limited(64, 20, 1000), "SizeLimitExceeded")]
#[case::too_many_pages(limited(10 * 1024 * 1024, 20, 2), "TooManyPages")]
fn test_upload_limits(#[case] mut collection: PageCollection, #[case] expected: &str) {
    let err = collection
        .upload(sample_pdf("A", 3), "a.pdf")
        .unwrap_err();

    assert!(err.is_validation());
    assert!(format!("{err:?}").starts_with(expected), "{err:?}");
    assert!(collection.is_empty());
    assert_eq!(collection.documents().count(), 0);
}

#[test]
fn test_document_count_limit() {
    let mut collection = limited(10 * 1024 * 1024, 2, 1000);

    let report = collection.upload_batch(
        ["a", "b", "c"].map(|label| (format!("{label}.pdf"), sample_pdf(label, 1))),
    );

    assert_eq!(report.accepted.len(), 2);
    assert!(matches!(
        report.rejected[0].error,
        PdfCollateError::TooManyDocuments { max: 2, .. }
    ));

    // Removing a document frees a slot.
    let first = report.accepted[0].0.id();
    collection.remove_document(first);
    assert!(collection.upload(sample_pdf("c", 1), "c.pdf").is_ok());
}

#[test]
fn test_uploads_get_fresh_ids() {
    let mut collection = PageCollection::default();
    let (a, a_pages) = collection.upload(sample_pdf("A", 2), "a.pdf").unwrap();
    collection.remove_document(a.id());

    let (again, again_pages) = collection.upload(sample_pdf("A", 2), "a.pdf").unwrap();
    assert_ne!(a.id(), again.id());
    assert!(
        a_pages
            .iter()
            .all(|old| again_pages.iter().all(|new| new.id != old.id))
    );
}

#[tokio::test]
async fn test_files_from_disk_with_edit_script() {
    let dir = temp_dir();
    let paths: Vec<_> = ["x", "y"]
        .iter()
        .zip([3, 2])
        .map(|(label, pages)| {
            let path = dir.path().join(format!("{label}.pdf"));
            std::fs::write(&path, sample_pdf(&label.to_uppercase(), pages)).unwrap();
            path
        })
        .collect();

    let (results, stats) = PdfReader::new().load_all(&paths, 2).await;
    assert_eq!(stats.success_count, 2);

    let mut collection = PageCollection::default();
    let report = collection.upload_batch(
        results
            .into_iter()
            .map(|result| result.unwrap())
            .map(|file| (file.name, file.bytes)),
    );
    let inputs: Vec<_> = report.accepted.iter().map(|(d, _)| Some(d.id())).collect();

    let script: Vec<Edit> = [
        "move 2:1 1",
        "delete 1:2",
        "select 1:1",
        "select 2:2",
        "delete-selected",
    ]
    .iter()
    .map(|s| s.parse().unwrap())
    .collect();
    collection.apply_edits(&script, &inputs).unwrap();

    let output = collection.merge().await.unwrap();
    assert_eq!(page_texts(&output.bytes), ["Y page 1", "X page 3"]);
}
