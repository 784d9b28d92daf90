//! Error types for pdfcollate.
//!
//! Every fallible operation in the crate returns [`PdfCollateError`]. The
//! variants follow the lifecycle of a session:
//!
//! # Error Categories
//!
//! - **Validation Errors**: an upload is too large, or a ceiling is reached
//! - **Parse Errors**: an upload is not a readable, unencrypted PDF
//! - **Merge Errors**: a dangling page reference, nothing to merge, a merge
//!   already in flight, or a cancelled merge
//! - **I/O Errors**: reading inputs or writing the merged output

use std::io;
use std::path::PathBuf;

use crate::collection::{DocumentId, PageId};

/// Result type alias for pdfcollate operations.
pub type Result<T> = std::result::Result<T, PdfCollateError>;

/// Main error type for pdfcollate operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfCollateError {
    /// Upload is larger than the configured maximum.
    #[error("File too large: {name} ({size} bytes, limit is {max} bytes)")]
    SizeLimitExceeded {
        /// Name of the rejected upload.
        name: String,
        /// Size of the upload in bytes.
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },

    /// Accepting the upload would exceed the document ceiling.
    #[error("Too many files: {name} would exceed the limit of {max} document(s)")]
    TooManyDocuments {
        /// Name of the rejected upload.
        name: String,
        /// Configured maximum document count.
        max: usize,
    },

    /// Upload has more pages than the per-document ceiling.
    #[error("Too many pages: {name} has {pages} page(s), limit is {max}")]
    TooManyPages {
        /// Name of the rejected upload.
        name: String,
        /// Page count of the upload.
        pages: usize,
        /// Configured maximum page count.
        max: usize,
    },

    /// Upload is not a well-formed PDF.
    #[error("Failed to parse PDF: {name}\n  Reason: {reason}")]
    Parse {
        /// Name of the document.
        name: String,
        /// Reason reported by the parser.
        reason: String,
    },

    /// Upload is encrypted and cannot be copied structurally.
    #[error(
        "PDF is encrypted and cannot be processed: {name}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools"
    )]
    EncryptedPdf {
        /// Name of the document.
        name: String,
    },

    /// A page references a source document that no longer exists.
    #[error("Page {page} references missing source document {document}")]
    MissingSource {
        /// Page holding the dangling reference.
        page: PageId,
        /// Document that could not be resolved.
        document: DocumentId,
    },

    /// Merge was requested on an empty page sequence.
    #[error("No pages to merge")]
    NothingToMerge,

    /// A merge is already running for this collection.
    #[error("A merge is already in progress")]
    Busy,

    /// The operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Document id is not present in the registry.
    #[error("Unknown document: {id}")]
    UnknownDocument {
        /// The unknown id.
        id: DocumentId,
    },

    /// Page id is not present in the page index.
    #[error("Unknown page: {id}")]
    UnknownPage {
        /// The unknown id.
        id: PageId,
    },

    /// Page count does not fit the source document.
    #[error("Invalid page count {requested} for {document} (document has {available} page(s))")]
    InvalidPageCount {
        /// Target document.
        document: DocumentId,
        /// Requested page count.
        requested: u32,
        /// Pages actually available.
        available: u32,
    },

    /// An edit step could not be parsed or applied.
    #[error("Invalid edit '{edit}': {reason}")]
    InvalidEdit {
        /// The offending edit text.
        edit: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Merge failed while assembling the output document.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    #[error("Cannot access file: {}\n  Reason: {source}", path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<anyhow::Error> for PdfCollateError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

impl PdfCollateError {
    /// Create a Parse error.
    pub fn parse(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(name: impl Into<String>) -> Self {
        Self::EncryptedPdf { name: name.into() }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidEdit error.
    pub fn invalid_edit(edit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEdit {
            edit: edit.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error rejected an upload because of a configured limit.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SizeLimitExceeded { .. }
                | Self::TooManyDocuments { .. }
                | Self::TooManyPages { .. }
        )
    }

    /// Check if this error is recoverable (operation can continue).
    ///
    /// Upload rejections are recoverable: the rest of a batch still goes in.
    /// A merge failure leaves the collection untouched, so it is retryable,
    /// but it is not recoverable within the same merge.
    pub fn is_recoverable(&self) -> bool {
        self.is_validation() || matches!(self, Self::Parse { .. } | Self::EncryptedPdf { .. })
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NothingToMerge
                | Self::FailedToCreateOutput { .. }
                | Self::FailedToWrite { .. }
                | Self::Cancelled
        )
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } | Self::FileNotAccessible { .. } => 2,
            Self::Parse { .. } | Self::EncryptedPdf { .. } => 3,
            Self::SizeLimitExceeded { .. }
            | Self::TooManyDocuments { .. }
            | Self::TooManyPages { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } | Self::FailedToWrite { .. } | Self::Io { .. } => 5,
            Self::MissingSource { .. } | Self::MergeFailed { .. } | Self::Busy => 6,
            Self::NothingToMerge
            | Self::UnknownDocument { .. }
            | Self::UnknownPage { .. }
            | Self::InvalidPageCount { .. }
            | Self::InvalidEdit { .. }
            | Self::InvalidConfig { .. }
            | Self::Other { .. } => 1,
            Self::Cancelled => 130, // Standard exit code for SIGINT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_size_limit_display() {
        let err = PdfCollateError::SizeLimitExceeded {
            name: "big.pdf".to_string(),
            size: 2048,
            max: 1024,
        };
        let msg = format!("{err}");
        assert!(msg.contains("too large"));
        assert!(msg.contains("big.pdf"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn test_encrypted_pdf_display() {
        let err = PdfCollateError::encrypted_pdf("secret.pdf");
        let msg = format!("{err}");
        assert!(msg.contains("encrypted"));
        assert!(msg.contains("secret.pdf"));
        assert!(msg.contains("Decrypt"));
    }

    #[test]
    fn test_missing_source_display() {
        let err = PdfCollateError::MissingSource {
            page: PageId::new(7),
            document: DocumentId::new(3),
        };
        let msg = format!("{err}");
        assert!(msg.contains("page-7"));
        assert!(msg.contains("doc-3"));
    }

    #[test]
    fn test_output_exists_display() {
        let err = PdfCollateError::output_exists(PathBuf::from("existing.pdf"));
        let msg = format!("{err}");
        assert!(msg.contains("already exists"));
        assert!(msg.contains("--force"));
    }

    #[test]
    fn test_is_validation() {
        assert!(
            PdfCollateError::TooManyDocuments {
                name: "a.pdf".to_string(),
                max: 2
            }
            .is_validation()
        );
        assert!(!PdfCollateError::parse("a.pdf", "bad header").is_validation());
        assert!(!PdfCollateError::Busy.is_validation());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(PdfCollateError::parse("bad.pdf", "error").is_recoverable());
        assert!(PdfCollateError::encrypted_pdf("secret.pdf").is_recoverable());
        assert!(!PdfCollateError::NothingToMerge.is_recoverable());
        assert!(!PdfCollateError::Cancelled.is_recoverable());
    }

    #[test]
    fn test_is_fatal() {
        assert!(PdfCollateError::NothingToMerge.is_fatal());
        assert!(PdfCollateError::Cancelled.is_fatal());
        assert!(!PdfCollateError::Busy.is_fatal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            PdfCollateError::file_not_found(PathBuf::from("x")).exit_code(),
            2
        );
        assert_eq!(PdfCollateError::parse("x", "error").exit_code(), 3);
        assert_eq!(PdfCollateError::NothingToMerge.exit_code(), 1);
        assert_eq!(
            PdfCollateError::output_exists(PathBuf::from("x")).exit_code(),
            4
        );
        assert_eq!(PdfCollateError::Busy.exit_code(), 6);
        assert_eq!(PdfCollateError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err: PdfCollateError = io_err.into();
        assert!(matches!(err, PdfCollateError::Io { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_source() {
        let err = PdfCollateError::FileNotAccessible {
            path: PathBuf::from("test.pdf"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(PdfCollateError::NothingToMerge.source().is_none());
    }
}
