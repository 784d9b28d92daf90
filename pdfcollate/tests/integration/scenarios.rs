//! End-to-end collection scenarios: upload, edit, merge.

use pdfcollate::{PageCollection, PdfCollateError};

use crate::common::{page_texts, x_and_y};

fn labels(collection: &PageCollection) -> Vec<String> {
    collection
        .pages()
        .iter()
        .map(|p| {
            let name = collection
                .document(p.source_document_id)
                .map(|d| d.name().trim_end_matches(".pdf").to_uppercase())
                .unwrap_or_default();
            format!("{name}{}", p.source_page_number)
        })
        .collect()
}

#[tokio::test]
async fn test_reorder_delete_and_merge() {
    let (mut collection, x, y) = x_and_y();
    assert_eq!(labels(&collection), ["X1", "X2", "X3", "Y1", "Y2"]);

    assert!(collection.reorder(y[0].id, 0));
    assert_eq!(labels(&collection), ["Y1", "X1", "X2", "X3", "Y2"]);

    assert!(collection.delete_one(x[1].id).is_some());
    assert_eq!(labels(&collection), ["Y1", "X1", "X3", "Y2"]);

    let output = collection.merge().await.unwrap();
    assert_eq!(output.statistics.pages_written, 4);
    assert_eq!(output.statistics.documents_parsed, 2);
    assert_eq!(
        page_texts(&output.bytes),
        ["Y page 1", "X page 1", "X page 3", "Y page 2"]
    );
}

#[tokio::test]
async fn test_select_and_delete_selected() {
    let (mut collection, x, y) = x_and_y();
    collection.reorder(y[0].id, 0);
    collection.delete_one(x[1].id);

    collection.toggle_select(x[0].id);
    collection.toggle_select(y[1].id);
    let removed = collection.delete_selected();

    assert_eq!(removed.len(), 2);
    assert_eq!(labels(&collection), ["Y1", "X3"]);
    assert!(collection.selection().is_empty());

    let output = collection.merge().await.unwrap();
    assert_eq!(page_texts(&output.bytes), ["Y page 1", "X page 3"]);
}

#[test]
fn test_remove_document_cascades() {
    let (mut collection, x, _) = x_and_y();
    collection.toggle_select(x[2].id);

    let removed = collection.remove_document(x[0].source_document_id);

    assert_eq!(removed.map(|d| d.name().to_string()).as_deref(), Some("x.pdf"));
    assert_eq!(labels(&collection), ["Y1", "Y2"]);
    assert!(collection.selection().is_empty());
    assert!(x.iter().all(|p| collection.page(p.id).is_none()));
}

#[tokio::test]
async fn test_merge_empty_collection() {
    let collection = PageCollection::default();

    let err = collection.merge().await.unwrap_err();
    assert!(matches!(err, PdfCollateError::NothingToMerge));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_second_merge_is_busy() {
    let (collection, _, _) = x_and_y();

    let first = collection.begin_merge().unwrap();
    assert!(collection.is_merging());
    assert!(matches!(
        collection.begin_merge(),
        Err(PdfCollateError::Busy)
    ));
    assert!(matches!(
        collection.merge().await,
        Err(PdfCollateError::Busy)
    ));

    let output = first.run().await.unwrap();
    assert_eq!(output.statistics.pages_written, 5);
    assert!(!collection.is_merging());

    // The slot is free again once the first job is gone.
    assert!(collection.merge().await.is_ok());
}

#[test]
fn test_identity_is_stable_across_edits() {
    let (mut collection, x, y) = x_and_y();
    let before: Vec<_> = collection.pages().to_vec();

    collection.reorder(x[0].id, 4);
    collection.reorder(y[1].id, 0);

    for page in &before {
        let after = collection.page(page.id).unwrap();
        assert_eq!(after, page);
    }
}

#[test]
fn test_repeated_edits_are_noops() {
    let (mut collection, x, _) = x_and_y();

    assert!(collection.delete_one(x[0].id).is_some());
    assert!(collection.delete_one(x[0].id).is_none());
    assert!(!collection.reorder(x[0].id, 0));

    let removed = collection.remove_document(x[0].source_document_id);
    assert!(removed.is_some());
    assert!(collection.remove_document(x[0].source_document_id).is_none());
    assert_eq!(collection.page_count(), 2);
}
