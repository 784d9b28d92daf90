//! pdfcollate - Collect pages from uploaded PDFs and merge them into one.
//!
//! This library keeps an ordered collection of pages drawn from any number of
//! uploaded PDF files and assembles the current order into a single document.
//! It supports:
//!
//! - Upload validation against size, file count and page count limits
//! - Per-page reorder, delete and multi-select operations
//! - Whole-document removal that cascades to its pages
//! - Snapshot-based merging with progress reporting and cancellation
//! - Output metadata and compression
//!
//! # Examples
//!
//! ## Collect and Merge
//!
//! ```no_run
//! use pdfcollate::PageCollection;
//!
//! # async fn example(x: Vec<u8>, y: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut collection = PageCollection::default();
//! let (_, x_pages) = collection.upload(x, "x.pdf")?;
//! let (_, y_pages) = collection.upload(y, "y.pdf")?;
//!
//! collection.reorder(y_pages[0].id, 0);
//! collection.delete_one(x_pages[1].id);
//!
//! let output = collection.merge().await?;
//! println!("Merged {} pages", output.statistics.pages_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Watching a Merge
//!
//! ```no_run
//! use pdfcollate::PageCollection;
//!
//! # async fn example(collection: PageCollection) -> Result<(), Box<dyn std::error::Error>> {
//! let job = collection.begin_merge()?;
//! let mut progress = collection.progress();
//! tokio::spawn(async move {
//!     while progress.changed().await.is_ok() {
//!         println!("{}", *progress.borrow_and_update());
//!     }
//! });
//!
//! let output = job.run().await?;
//! std::fs::write(&collection.options().file_name, &output.bytes)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod output;
pub mod renderer;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use collection::{DocumentId, Page, PageCollection, PageId, SourceDocument};
pub use config::Config;
pub use error::{PdfCollateError, Result};
pub use merge::{MergeOutput, MergeProgress};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
