//! PDF reading and loading operations.
//!
//! This module provides:
//! - Parsing of in-memory PDF bytes into a page-addressable document
//! - Loading upload bytes from disk, sequentially or with bounded parallelism
//! - Load statistics for a batch
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::io::reader::PdfReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (results, stats) = reader.load_all(&paths, 4).await;
//! println!("Read {} file(s), {}", stats.success_count, stats.format_total_size());
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{PdfCollateError, Result};
use crate::utils::format_file_size;

/// Raw bytes of a file read from disk, ready to be uploaded.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// Path to the source file.
    pub path: PathBuf,

    /// Display name (the file name component of the path).
    pub name: String,

    /// File content.
    pub bytes: Vec<u8>,

    /// Time taken to read the file.
    pub load_time: Duration,
}

impl LoadedFile {
    /// File size in bytes.
    pub fn file_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of a load operation (success or failure).
pub type LoadResult = Result<LoadedFile>;

/// Statistics for a batch load operation.
#[derive(Debug, Clone)]
pub struct LoadStatistics {
    /// Number of files successfully read.
    pub success_count: usize,

    /// Number of files that failed to read.
    pub failure_count: usize,

    /// Total time taken for all loads.
    pub total_time: Duration,

    /// Total size of successfully read files.
    pub total_size: u64,
}

impl LoadStatistics {
    fn from_results(results: &[LoadResult], total_time: Duration) -> Self {
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_size = 0;

        for result in results {
            match result {
                Ok(loaded) => {
                    success_count += 1;
                    total_size += loaded.file_size();
                }
                Err(_) => failure_count += 1,
            }
        }

        Self {
            success_count,
            failure_count,
            total_time,
            total_size,
        }
    }

    /// Format total size as human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// PDF reader for uploads.
#[derive(Debug, Clone, Copy)]
pub struct PdfReader {
    /// Whether a parsed document must have at least one page.
    verify: bool,
}

impl PdfReader {
    /// Create a new PDF reader with default settings.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Create a reader that accepts documents without pages.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The bytes are not a PDF
    /// - The PDF is encrypted
    /// - The document has no pages (when verifying)
    pub fn parse(&self, name: &str, bytes: &[u8]) -> Result<Document> {
        let doc = Document::load_mem(bytes).map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("encrypt") || err_msg.contains("password") {
                PdfCollateError::encrypted_pdf(name)
            } else {
                PdfCollateError::parse(name, err_msg)
            }
        })?;

        if doc.is_encrypted() {
            return Err(PdfCollateError::encrypted_pdf(name));
        }

        if self.verify && doc.get_pages().is_empty() {
            return Err(PdfCollateError::parse(name, "PDF has no pages"));
        }

        Ok(doc)
    }

    /// Read a single file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub async fn load(&self, path: &Path) -> Result<LoadedFile> {
        let start = Instant::now();

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PdfCollateError::file_not_found(path.to_path_buf())
            } else {
                PdfCollateError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!(file = %path.display(), size = bytes.len(), "Read upload from disk");

        Ok(LoadedFile {
            path: path.to_path_buf(),
            name,
            bytes,
            load_time: start.elapsed(),
        })
    }

    /// Read files one at a time in the order provided.
    pub async fn load_sequential(&self, paths: &[PathBuf]) -> Vec<LoadResult> {
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            results.push(self.load(path).await);
        }

        results
    }

    /// Read files concurrently with at most `workers` reads in flight.
    ///
    /// Results come back in input order, so upload order matches the
    /// command line no matter which read finishes first.
    pub async fn load_parallel(&self, paths: &[PathBuf], workers: usize) -> Vec<LoadResult> {
        use futures::stream::{self, StreamExt};

        let workers = workers.max(1);
        let reader = *self;

        let tasks = paths.iter().map(|path| {
            let path = path.clone();
            async move { reader.load(&path).await }
        });

        stream::iter(tasks)
            .buffered(workers)
            .collect::<Vec<_>>()
            .await
    }

    /// Read all files, choosing sequential or parallel reads by batch size.
    pub async fn load_all(
        &self,
        paths: &[PathBuf],
        max_workers: usize,
    ) -> (Vec<LoadResult>, LoadStatistics) {
        let start = Instant::now();

        let results = if paths.len() <= 3 {
            self.load_sequential(paths).await
        } else {
            self.load_parallel(paths, max_workers).await
        };

        let stats = LoadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}
