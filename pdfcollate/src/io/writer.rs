//! PDF serialization and saving.
//!
//! This module provides:
//! - Serialization of an assembled document to bytes, with optional compression
//! - Atomic writes of merged bytes (write to temp file, then rename)
//! - Output pre-flight checks
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::io::writer::PdfWriter;
//! use std::path::Path;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! let stats = writer.save_bytes(&bytes, Path::new("merged-document.pdf")).await?;
//! println!("Wrote {} in {:?}", stats.format_file_size(), stats.write_time);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;

use crate::config::CompressionLevel;
use crate::error::{PdfCollateError, Result};
use crate::utils::format_file_size;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Use atomic writes (write to temp file, then rename).
    pub atomic: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer without atomic writes.
    pub fn non_atomic() -> Self {
        Self {
            options: WriteOptions {
                atomic: false,
                ..Default::default()
            },
        }
    }

    /// Serialize a document, applying `compression` first.
    ///
    /// This is CPU-bound; async callers run it on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if lopdf fails to write the document.
    pub fn serialize(mut doc: Document, compression: CompressionLevel) -> Result<Vec<u8>> {
        match compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => doc.compress(),
            CompressionLevel::Maximum => {
                doc.compress();
                doc.prune_objects();
                doc.renumber_objects();
            }
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| PdfCollateError::merge_failed(format!("Failed to serialize output: {e}")))?;
        Ok(bytes)
    }

    /// Write merged bytes to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output directory doesn't exist
    /// - Insufficient permissions
    /// - Disk full
    pub async fn save_bytes(&self, bytes: &[u8], path: &Path) -> Result<WriteStatistics> {
        let start = Instant::now();

        let write_path = if self.options.atomic {
            path.with_extension("tmp")
        } else {
            path.to_path_buf()
        };

        let file = tokio::fs::File::create(&write_path).await.map_err(|e| {
            PdfCollateError::FailedToCreateOutput {
                path: write_path.clone(),
                source: e,
            }
        })?;

        let mut writer = tokio::io::BufWriter::with_capacity(self.options.buffer_size, file);
        let written = async {
            writer.write_all(bytes).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            if self.options.atomic {
                let _ = tokio::fs::remove_file(&write_path).await;
            }
            return Err(PdfCollateError::FailedToWrite {
                path: write_path,
                source: e,
            });
        }

        if self.options.atomic {
            tokio::fs::rename(&write_path, path)
                .await
                .map_err(|e| PdfCollateError::FailedToWrite {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }

        tracing::info!(output = %path.display(), size = bytes.len(), "Wrote merged document");

        Ok(WriteStatistics {
            write_time: start.elapsed(),
            file_size: bytes.len() as u64,
            output_path: path.to_path_buf(),
        })
    }

    /// Check if a file can be written to the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory doesn't exist
    /// - Parent directory is not writable
    pub async fn can_write(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        let metadata = tokio::fs::metadata(parent).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PdfCollateError::invalid_config(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                ))
            } else {
                PdfCollateError::FileNotAccessible {
                    path: parent.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if metadata.permissions().readonly() {
            return Err(PdfCollateError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }

    /// Check if output file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}
