//! CLI argument parsing for pdfcollate.
//!
//! This module defines the command-line interface structure using `clap`
//! and turns parsed arguments into a validated [`Config`].

use clap::Parser;
use std::path::PathBuf;

use pdfcollate::config::{Config, Edit, Limits, MergeOptions, Metadata, OverwriteMode};
use pdfcollate::error::{PdfCollateError, Result};

/// Collect pages from several PDF files and merge them into one.
///
/// Every page of every input is collected in command-line order. Edit steps
/// then reorder, delete or select pages before the result is written.
#[derive(Parser, Debug)]
#[command(name = "pdfcollate")]
#[command(version)]
#[command(about = "Collect, reorder and prune pages from several PDFs into one", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input PDF files (in upload order)
    ///
    /// Inputs are numbered from 1 in the order given; edit steps refer to
    /// them by that number.
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Edit step, repeatable, applied in order after upload
    ///
    /// D is the 1-based input number, P a 1-based page of that input and
    /// TO a 1-based output position.
    ///
    /// Steps:
    ///   move D:P TO | delete D:P | select D:P |
    ///   delete-selected | clear-selection | remove-doc D
    ///
    /// Example:
    ///   pdfcollate x.pdf y.pdf -e "move 2:1 1" -e "delete 1:2" -o out.pdf
    #[arg(short, long = "edit", value_name = "EDIT")]
    pub edits: Vec<String>,

    /// Dry run - apply edits and print the final layout without merging
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the final layout as JSON (implies --dry-run)
    #[arg(long)]
    pub json: bool,

    /// Verbose output - show details for each upload and the merge
    #[arg(short, long)]
    pub verbose: bool,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Compression level for output PDF
    ///
    /// - none: Copied pages keep their exact stream bytes (default)
    /// - standard: Compress uncompressed streams
    /// - maximum: Compress and drop unreferenced objects
    #[arg(short, long, value_name = "LEVEL")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: Option<String>,

    /// Set title metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for output PDF (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Largest accepted input, in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Largest number of inputs held at once
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Largest page count accepted for one input
    #[arg(long, value_name = "N")]
    pub max_pages: Option<usize>,

    /// Number of parallel file reads
    ///
    /// Default is number of CPU cores. Use 1 for sequential reads.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// Limits and compression start from the `PDFCOLLATE_*` environment
    /// variables and are then overridden by flags.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable or flag is malformed, an
    /// edit step cannot be parsed, or configuration validation fails.
    pub fn to_config(&self) -> Result<Config> {
        self.to_config_with(Limits::from_env()?, MergeOptions::from_env()?)
    }

    fn to_config_with(&self, base_limits: Limits, base_options: MergeOptions) -> Result<Config> {
        let compression = match &self.compression {
            Some(level) => level.parse()?,
            None => base_options.compression,
        };

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let limits = Limits {
            max_file_size: self.max_file_size.unwrap_or(base_limits.max_file_size),
            max_documents: self.max_files.unwrap_or(base_limits.max_documents),
            max_pages_per_document: self
                .max_pages
                .unwrap_or(base_limits.max_pages_per_document),
        };

        let edits = self
            .edits
            .iter()
            .map(|step| step.parse::<Edit>())
            .collect::<Result<Vec<_>>>()?;

        let merge = MergeOptions {
            compression,
            metadata: Metadata::new(
                self.title.clone(),
                self.author.clone(),
                self.subject.clone(),
                self.keywords.clone(),
            ),
            ..base_options
        };

        let config = Config {
            inputs: self.inputs.clone(),
            output: self.output.clone(),
            dry_run: self.dry_run || self.json,
            verbose: self.verbose,
            quiet: self.quiet,
            json: self.json,
            overwrite_mode,
            limits,
            merge,
            edits,
            jobs: self.jobs,
        };

        config.validate().map_err(|e| {
            PdfCollateError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric flag is zero.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(PdfCollateError::invalid_config("No input files specified"));
        }

        let zero = [
            ("--jobs", self.jobs.map(|n| n as u64)),
            ("--max-file-size", self.max_file_size),
            ("--max-files", self.max_files.map(|n| n as u64)),
            ("--max-pages", self.max_pages.map(|n| n as u64)),
        ]
        .into_iter()
        .find(|(_, value)| *value == Some(0));

        if let Some((flag, _)) = zero {
            return Err(PdfCollateError::invalid_config(format!(
                "{flag} must be at least 1"
            )));
        }

        Ok(())
    }
}
