//! Uploaded source documents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Session-unique identifier of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// An uploaded file parsed into a page-addressable document.
///
/// The raw bytes are immutable and shared: cloning a `SourceDocument` (for a
/// merge snapshot, for instance) never copies the content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    id: DocumentId,
    name: String,
    byte_len: u64,
    page_count: u32,
    version: String,
    page_dimensions: Option<(f32, f32)>,
    #[serde(skip)]
    content: Arc<[u8]>,
}

impl SourceDocument {
    pub(crate) fn new(
        id: DocumentId,
        name: String,
        content: Arc<[u8]>,
        page_count: u32,
        version: String,
        page_dimensions: Option<(f32, f32)>,
    ) -> Self {
        Self {
            id,
            name,
            byte_len: content.len() as u64,
            page_count,
            version,
            page_dimensions,
            content,
        }
    }

    /// Document id.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Name the document was uploaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the upload in bytes.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Number of pages found when the upload was parsed.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// PDF header version, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Width and height of the first page in points, when declared.
    pub fn page_dimensions(&self) -> Option<(f32, f32)> {
        self.page_dimensions
    }

    /// Raw, read-only document bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub(crate) fn shared_content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }
}
