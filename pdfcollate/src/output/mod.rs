//! Output formatting and display for pdfcollate.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages
//! - Progress rendering
//! - Upload and merge summaries
//! - The final page layout, as text or JSON
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::output::OutputFormatter;
//! use pdfcollate::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Starting merge operation");
//! formatter.success("Merge completed successfully");
//! # }
//! ```

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::{ProgressBar, ProgressStyle};

use serde::Serialize;

use crate::collection::{DocumentId, PageCollection, PageId, UploadReport};
use crate::io::LoadStatistics;
use crate::merge::MergeStatistics;

/// One output position in the final layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    /// 1-based output position.
    pub position: usize,
    /// Page identity.
    pub page_id: PageId,
    /// Source document identity.
    pub document_id: DocumentId,
    /// Source document name.
    pub document: String,
    /// 1-based page number within the source document.
    pub source_page: u32,
}

/// The pages a merge would write, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Total output pages.
    pub page_count: usize,
    /// Suggested output file name.
    pub file_name: String,
    /// Pages in output order.
    pub pages: Vec<LayoutEntry>,
}

impl Layout {
    /// Describe the current state of a collection.
    pub fn of(collection: &PageCollection) -> Self {
        let pages = collection
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| LayoutEntry {
                position: index + 1,
                page_id: page.id,
                document_id: page.source_document_id,
                document: collection
                    .document(page.source_document_id)
                    .map(|doc| doc.name().to_string())
                    .unwrap_or_default(),
                source_page: page.source_page_number,
            })
            .collect::<Vec<_>>();

        Self {
            page_count: pages.len(),
            file_name: collection.options().file_name.clone(),
            pages,
        }
    }

    /// Render as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::PdfCollateError::other(e.to_string()))
    }
}

/// Display load statistics to the user.
pub fn display_load_statistics(formatter: &OutputFormatter, stats: &LoadStatistics) {
    if stats.failure_count > 0 {
        formatter.warning(&format!(
            "Warning: {} file(s) failed to load",
            stats.failure_count
        ));
    }

    formatter.debug(&format!(
        "Read {} file(s) in {:.2}s, {}",
        stats.success_count,
        stats.total_time.as_secs_f64(),
        stats.format_total_size()
    ));
}

/// Display accepted and rejected uploads.
pub fn display_upload_report(formatter: &OutputFormatter, report: &UploadReport) {
    for rejected in &report.rejected {
        formatter.warning(&format!("Rejected {}: {}", rejected.name, rejected.error));
    }

    for (document, pages) in &report.accepted {
        formatter.debug(&format!(
            "Accepted {} ({}): {} page(s), PDF {}",
            document.name(),
            document.id(),
            pages.len(),
            document.version()
        ));
    }

    formatter.info(&format!(
        "Uploaded {} file(s): {} page(s)",
        report.accepted.len(),
        report.pages_added()
    ));
}

/// Print the layout as a numbered list.
pub fn display_layout(formatter: &OutputFormatter, layout: &Layout) {
    formatter.section(&format!(
        "Layout of {} ({} page(s)):",
        layout.file_name, layout.page_count
    ));
    for entry in &layout.pages {
        formatter.list_item(
            entry.position,
            &format!("{} page {}", entry.document, entry.source_page),
        );
    }
}

/// Display merge statistics to the user.
pub fn display_merge_statistics(formatter: &OutputFormatter, stats: &MergeStatistics) {
    formatter.detail("Documents parsed", &stats.documents_parsed.to_string());
    formatter.detail("Parse time", &format!("{:.2}s", stats.parse_time.as_secs_f64()));
    formatter.detail("Compression", &format!("{:?}", stats.compression));

    formatter.success(&format!(
        "Merged {} page(s) in {:.2}s ({})",
        stats.pages_written,
        stats.merge_time.as_secs_f64(),
        stats.format_output_size()
    ));
}
