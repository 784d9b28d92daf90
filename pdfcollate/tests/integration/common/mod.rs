//! Shared helpers for pdfcollate integration tests.
//!
//! Test PDFs are generated in memory, so no fixtures need to be checked in.

#![allow(dead_code)]

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pdfcollate::{Page, PageCollection};

/// Build a PDF whose page `n` draws the text `"{label} page {n}"`.
///
/// `MediaBox` and `Resources` are set on the page tree root only, so
/// pages inherit them.
pub fn sample_pdf(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content = format!("BT /F1 18 Tf 50 700 Td ({label} page {n}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }))
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => [0, 0, 612, 792].map(Object::Integer).to_vec(),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize sample PDF");
    bytes
}

/// Text drawn by each page of a merged PDF, in page order.
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("Merged output is not a valid PDF");
    doc.get_pages()
        .values()
        .map(|&id: &ObjectId| {
            let content = doc.get_page_content(id).expect("Page has no content");
            let text = String::from_utf8_lossy(&content).into_owned();
            let start = text.find('(').map_or(0, |i| i + 1);
            let end = text.rfind(')').unwrap_or(text.len());
            text[start..end].to_string()
        })
        .collect()
}

/// Collection holding X (3 pages) then Y (2 pages).
pub fn x_and_y() -> (PageCollection, Vec<Page>, Vec<Page>) {
    let mut collection = PageCollection::default();
    let (_, x) = collection
        .upload(sample_pdf("X", 3), "x.pdf")
        .expect("Failed to upload X");
    let (_, y) = collection
        .upload(sample_pdf("Y", 2), "y.pdf")
        .expect("Failed to upload Y");
    (collection, x, y)
}

/// Create a temporary directory for output files.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}
