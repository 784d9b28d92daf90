//! Configuration module for pdfcollate.
//!
//! This module holds everything that shapes a session and its merge:
//! - Upload limits, with environment overrides
//! - Merge output options (compression, document metadata)
//! - The edit script a non-interactive caller applies to the page collection
//! - The validated CLI-level configuration

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::PdfCollateError;
use std::{fmt, path::PathBuf, str::FromStr};

/// Default file name for the merged output.
pub const DEFAULT_FILE_NAME: &str = "merged-document.pdf";

/// Environment variable overriding [`Limits::max_file_size`].
pub const ENV_MAX_FILE_SIZE: &str = "PDFCOLLATE_MAX_FILE_SIZE";
/// Environment variable overriding [`Limits::max_documents`].
pub const ENV_MAX_FILES: &str = "PDFCOLLATE_MAX_FILES";
/// Environment variable overriding [`Limits::max_pages_per_document`].
pub const ENV_MAX_PAGES: &str = "PDFCOLLATE_MAX_PAGES";
/// Environment variable overriding [`MergeOptions::compression`].
pub const ENV_COMPRESSION: &str = "PDFCOLLATE_COMPRESSION";

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - copied pages keep their exact stream bytes.
    #[default]
    None,
    /// Compress uncompressed streams.
    Standard,
    /// Compress streams and prune unreferenced objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = crate::PdfCollateError;
    /// Parse compression level from string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a valid compression level.
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PdfCollateError::InvalidConfig {
                message: format!(
                    "Invalid compression level: {s}. Must be one of: none, standard, maximum"
                ),
            }),
        }
    }
}

/// Ceilings enforced when a document is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    /// Largest accepted upload, in bytes.
    pub max_file_size: u64,
    /// Largest number of documents held at once.
    pub max_documents: usize,
    /// Largest page count accepted for a single document.
    pub max_pages_per_document: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_documents: 20,
            max_pages_per_document: 1000,
        }
    }
}

impl Limits {
    /// Build limits from the process environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but is not a positive integer.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build limits from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            max_file_size: read_positive(&lookup, ENV_MAX_FILE_SIZE)?
                .unwrap_or(defaults.max_file_size),
            max_documents: read_positive(&lookup, ENV_MAX_FILES)?
                .map(|n| n as usize)
                .unwrap_or(defaults.max_documents),
            max_pages_per_document: read_positive(&lookup, ENV_MAX_PAGES)?
                .map(|n| n as usize)
                .unwrap_or(defaults.max_pages_per_document),
        })
    }
}

fn read_positive<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
    if value == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Some(value))
}

/// PDF metadata to set on the output document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }
}

/// Options applied to the assembled document before serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOptions {
    /// Compression applied to the output.
    pub compression: CompressionLevel,
    /// Info dictionary entries for the output.
    pub metadata: Metadata,
    /// Suggested name for the merged file.
    pub file_name: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::default(),
            metadata: Metadata::default(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl MergeOptions {
    /// Merge options with the compression level taken from the environment.
    pub fn from_env() -> crate::Result<Self> {
        let compression = match std::env::var(ENV_COMPRESSION) {
            Ok(raw) => raw.parse()?,
            Err(_) => CompressionLevel::default(),
        };
        Ok(Self {
            compression,
            ..Self::default()
        })
    }
}

/// Reference to one page of one input, both 1-based: `DOC:PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    /// Position of the input document on the command line.
    pub document: usize,
    /// Page number inside that document.
    pub page: u32,
}

impl FromStr for PageRef {
    type Err = PdfCollateError;

    fn from_str(s: &str) -> crate::Result<Self> {
        parse_page_ref(s).map_err(|e| PdfCollateError::invalid_edit(s, e.to_string()))
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document, self.page)
    }
}

fn parse_page_ref(s: &str) -> Result<PageRef> {
    let Some((doc, page)) = s.trim().split_once(':') else {
        bail!("expected DOC:PAGE, e.g. '2:1'");
    };
    let document: usize = doc
        .trim()
        .parse()
        .with_context(|| format!("invalid document number: {doc}"))?;
    let page: u32 = page
        .trim()
        .parse()
        .with_context(|| format!("invalid page number: {page}"))?;
    if document == 0 || page == 0 {
        bail!("document and page numbers are 1-indexed");
    }
    Ok(PageRef { document, page })
}

/// One step of an edit script applied to the page collection.
///
/// Accepted forms:
/// - `move DOC:PAGE POSITION` (position is 1-based)
/// - `delete DOC:PAGE`
/// - `select DOC:PAGE`
/// - `delete-selected`
/// - `clear-selection`
/// - `remove-doc DOC`
///
/// # Examples
///
/// ```
/// use pdfcollate::config::{Edit, PageRef};
///
/// let edit: Edit = "move 2:1 1".parse().unwrap();
/// assert_eq!(edit, Edit::Move { page: PageRef { document: 2, page: 1 }, to: 0 });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Edit {
    /// Move a page to a 0-based position.
    Move {
        /// Page to move.
        page: PageRef,
        /// Target position, 0-based.
        to: usize,
    },
    /// Delete one page.
    Delete {
        /// Page to delete.
        page: PageRef,
    },
    /// Toggle a page's selection.
    Select {
        /// Page to toggle.
        page: PageRef,
    },
    /// Delete every selected page.
    DeleteSelected,
    /// Drop the current selection.
    ClearSelection,
    /// Remove an input document and all of its pages.
    RemoveDocument {
        /// Input position, 1-based.
        document: usize,
    },
}

impl FromStr for Edit {
    type Err = PdfCollateError;

    fn from_str(s: &str) -> crate::Result<Self> {
        parse_edit(s).map_err(|e| PdfCollateError::invalid_edit(s, e.to_string()))
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { page, to } => write!(f, "move {page} {}", to + 1),
            Self::Delete { page } => write!(f, "delete {page}"),
            Self::Select { page } => write!(f, "select {page}"),
            Self::DeleteSelected => write!(f, "delete-selected"),
            Self::ClearSelection => write!(f, "clear-selection"),
            Self::RemoveDocument { document } => write!(f, "remove-doc {document}"),
        }
    }
}

fn parse_edit(s: &str) -> Result<Edit> {
    let words: Vec<&str> = s.split_whitespace().collect();
    let edit = match words.as_slice() {
        ["move", page, to] => {
            let to: usize = to
                .parse()
                .with_context(|| format!("invalid position: {to}"))?;
            if to == 0 {
                bail!("positions are 1-indexed");
            }
            Edit::Move {
                page: parse_page_ref(page)?,
                to: to - 1,
            }
        }
        ["delete", page] => Edit::Delete {
            page: parse_page_ref(page)?,
        },
        ["select", page] => Edit::Select {
            page: parse_page_ref(page)?,
        },
        ["delete-selected"] => Edit::DeleteSelected,
        ["clear-selection"] => Edit::ClearSelection,
        ["remove-doc", doc] => {
            let document: usize = doc
                .parse()
                .with_context(|| format!("invalid document number: {doc}"))?;
            if document == 0 {
                bail!("document numbers are 1-indexed");
            }
            Edit::RemoveDocument { document }
        }
        [] => bail!("empty edit"),
        [op, ..] => bail!(
            "unknown or malformed operation '{op}'. Expected one of: move, delete, select, \
             delete-selected, clear-selection, remove-doc"
        ),
    };
    Ok(edit)
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Complete configuration for one non-interactive collate run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input PDF file paths, uploaded in this order.
    pub inputs: Vec<PathBuf>,

    /// Output PDF file path.
    pub output: PathBuf,

    /// Dry run mode - apply edits and report the layout without merging.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Print the final layout as JSON.
    pub json: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Upload ceilings.
    pub limits: Limits,

    /// Output options.
    pub merge: MergeOptions,

    /// Edit script, applied in order after upload.
    pub edits: Vec<Edit>,

    /// Number of parallel file reads (None = auto-detect).
    pub jobs: Option<usize>,
}

impl Config {
    /// Returns a reference to inputs.
    pub fn inputs(&self) -> &[PathBuf] {
        self.inputs.as_ref()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - An edit refers to an input that does not exist
    /// - The output path is also an input
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            bail!("Number of jobs must be at least 1");
        }

        for edit in &self.edits {
            let document = match edit {
                Edit::Move { page, .. } | Edit::Delete { page } | Edit::Select { page } => {
                    page.document
                }
                Edit::RemoveDocument { document } => *document,
                Edit::DeleteSelected | Edit::ClearSelection => continue,
            };
            if document > self.inputs.len() {
                bail!(
                    "Edit '{edit}' refers to input {document}, but only {} input(s) were given",
                    self.inputs.len()
                );
            }
        }

        for input in &self.inputs {
            if input == &self.output {
                bail!(
                    "Output file cannot be the same as an input file: {}",
                    self.output.display()
                );
            }
        }

        Ok(())
    }

    /// Get the effective number of parallel file reads.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Check if output should be displayed.
    ///
    /// Returns false if in quiet mode and not doing a dry run.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}
