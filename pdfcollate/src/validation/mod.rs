//! Upload validation for pdfcollate.
//!
//! Every upload goes through the [`Validator`] before it is registered. The
//! checks run cheapest first:
//! - Document count ceiling
//! - File size ceiling
//! - PDF header presence
//! - Full parse, encryption detection and page count ceiling
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::config::Limits;
//! use pdfcollate::validation::Validator;
//!
//! # fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new(Limits::default());
//! let result = validator.validate_upload("input.pdf", &bytes, 0)?;
//! println!("PDF has {} pages", result.page_count);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::error::{PdfCollateError, Result};
use crate::io::PdfReader;

/// How far into the file the `%PDF-` marker may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Result of validating a single upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Name of the upload.
    pub name: String,

    /// Number of pages in the PDF.
    pub page_count: usize,

    /// PDF header version.
    pub version: String,

    /// Size of the upload in bytes.
    pub file_size: u64,

    /// Number of objects in the PDF.
    pub object_count: usize,

    /// Page dimensions (width, height) in points, if available.
    pub page_dimensions: Option<(f32, f32)>,
}

impl ValidationResult {
    fn from_document(name: &str, file_size: u64, doc: &Document) -> Self {
        let pages = doc.get_pages();

        // MediaBox may sit on the page itself or on an ancestor Pages node.
        let page_dimensions = pages.values().next().and_then(|&page_id| {
            let mut node = doc.get_dictionary(page_id).ok();
            while let Some(dict) = node {
                if let Ok(lopdf::Object::Array(arr)) = dict.get(b"MediaBox")
                    && arr.len() >= 4
                {
                    let width = arr[2].as_float().ok()?;
                    let height = arr[3].as_float().ok()?;
                    return Some((width, height));
                }
                node = dict
                    .get(b"Parent")
                    .and_then(|p| p.as_reference())
                    .and_then(|id| doc.get_dictionary(id))
                    .ok();
            }
            None
        });

        Self {
            name: name.to_string(),
            page_count: pages.len(),
            version: doc.version.clone(),
            file_size,
            object_count: doc.objects.len(),
            page_dimensions,
        }
    }
}

/// Validator for uploads.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: Limits,
    reader: PdfReader,
}

impl Validator {
    /// Create a validator enforcing `limits`.
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            reader: PdfReader::new(),
        }
    }

    /// Limits this validator enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate one upload.
    ///
    /// `current_documents` is the number of documents already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Registering the upload would exceed the document ceiling
    /// - The upload is larger than the size ceiling
    /// - The bytes are not a readable, unencrypted PDF with pages
    /// - The page count exceeds the per-document ceiling
    pub fn validate_upload(
        &self,
        name: &str,
        bytes: &[u8],
        current_documents: usize,
    ) -> Result<ValidationResult> {
        self.check_capacity(name, current_documents)?;
        self.check_size(name, bytes.len() as u64)?;
        Self::check_header(name, bytes)?;

        let doc = self.reader.parse(name, bytes)?;
        let result = ValidationResult::from_document(name, bytes.len() as u64, &doc);

        if result.page_count > self.limits.max_pages_per_document {
            return Err(PdfCollateError::TooManyPages {
                name: name.to_string(),
                pages: result.page_count,
                max: self.limits.max_pages_per_document,
            });
        }

        Ok(result)
    }

    /// Check the document count ceiling.
    pub fn check_capacity(&self, name: &str, current_documents: usize) -> Result<()> {
        if current_documents >= self.limits.max_documents {
            return Err(PdfCollateError::TooManyDocuments {
                name: name.to_string(),
                max: self.limits.max_documents,
            });
        }
        Ok(())
    }

    /// Check the file size ceiling.
    pub fn check_size(&self, name: &str, size: u64) -> Result<()> {
        if size > self.limits.max_file_size {
            return Err(PdfCollateError::SizeLimitExceeded {
                name: name.to_string(),
                size,
                max: self.limits.max_file_size,
            });
        }
        Ok(())
    }

    /// Check that a `%PDF-` header appears near the start of the bytes.
    pub fn check_header(name: &str, bytes: &[u8]) -> Result<()> {
        let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
        if window.windows(5).any(|w| w == b"%PDF-") {
            Ok(())
        } else {
            Err(PdfCollateError::parse(name, "missing %PDF- header"))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}
