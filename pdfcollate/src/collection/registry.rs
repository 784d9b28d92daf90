//! Storage of uploaded documents.

use std::sync::Arc;

use super::{DocumentId, SourceDocument};
use crate::config::Limits;
use crate::error::{PdfCollateError, Result};
use crate::validation::Validator;

/// Owner of every uploaded [`SourceDocument`], in upload order.
#[derive(Debug, Clone)]
pub struct UploadRegistry {
    documents: Vec<SourceDocument>,
    next_id: u64,
    validator: Validator,
}

impl UploadRegistry {
    /// Create an empty registry enforcing `limits`.
    pub fn new(limits: Limits) -> Self {
        Self {
            documents: Vec::new(),
            next_id: 0,
            validator: Validator::new(limits),
        }
    }

    /// Validate and register an upload.
    ///
    /// No pages are created; see
    /// [`PageCollection::upload`](crate::PageCollection::upload) for that.
    ///
    /// # Errors
    ///
    /// Returns the first failed check of [`Validator::validate_upload`]. A
    /// rejected upload leaves the registry unchanged.
    pub fn add_document(
        &mut self,
        bytes: Vec<u8>,
        name: impl Into<String>,
    ) -> Result<SourceDocument> {
        let name = name.into();
        let result = self
            .validator
            .validate_upload(&name, &bytes, self.documents.len())?;

        let page_count =
            u32::try_from(result.page_count).map_err(|_| PdfCollateError::TooManyPages {
                name: name.clone(),
                pages: result.page_count,
                max: self.validator.limits().max_pages_per_document,
            })?;

        self.next_id += 1;
        let document = SourceDocument::new(
            DocumentId::new(self.next_id),
            name,
            Arc::from(bytes),
            page_count,
            result.version,
            result.page_dimensions,
        );

        tracing::info!(
            document = %document.id(),
            name = document.name(),
            pages = page_count,
            size = document.byte_len(),
            "Registered upload"
        );

        self.documents.push(document.clone());
        Ok(document)
    }

    /// Remove a document. Absent ids are ignored.
    pub fn remove_document(&mut self, id: DocumentId) -> Option<SourceDocument> {
        let position = self.documents.iter().position(|doc| doc.id() == id)?;
        let removed = self.documents.remove(position);
        tracing::info!(document = %id, name = removed.name(), "Removed document");
        Some(removed)
    }

    /// Look up a document.
    pub fn get(&self, id: DocumentId) -> Option<&SourceDocument> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    /// Check whether a document is registered.
    pub fn contains(&self, id: DocumentId) -> bool {
        self.get(id).is_some()
    }

    /// Documents in upload order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceDocument> {
        self.documents.iter()
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Combined size of all registered uploads.
    pub fn total_bytes(&self) -> u64 {
        self.documents.iter().map(SourceDocument::byte_len).sum()
    }

    /// Limits enforced on uploads.
    pub fn limits(&self) -> &Limits {
        self.validator.limits()
    }
}

impl Default for UploadRegistry {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}
