//! pdfcollate - Collect pages from several PDFs and merge them into one.
//!
//! Uploads every input, applies the edit script, then writes the merged
//! document or prints the final layout.

mod cli;

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use pdfcollate::config::{Config, OverwriteMode};
use pdfcollate::error::PdfCollateError;
use pdfcollate::io::{PdfReader, PdfWriter};
use pdfcollate::output::progress::{self, ProgressBar, ProgressStyle};
use pdfcollate::output::{
    Layout, OutputFormatter, display_layout, display_load_statistics, display_merge_statistics,
    display_upload_report,
};
use pdfcollate::{DocumentId, PageCollection};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Send library diagnostics to stderr, filtered by `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "pdfcollate=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), PdfCollateError> {
    cli.validate()?;
    let config = cli.to_config()?;
    let formatter = OutputFormatter::from_config(&config);

    if formatter.should_print() && !config.json {
        formatter.section(&format!("{} v{}", pdfcollate::NAME, pdfcollate::VERSION));
        formatter.blank_line();
    }

    let mut collection = PageCollection::new(config.limits, config.merge.clone());
    let inputs = upload_inputs(&config, &mut collection, &formatter).await?;

    collection.apply_edits(&config.edits, &inputs)?;

    if config.dry_run {
        let layout = Layout::of(&collection);
        if config.json {
            println!("{}", layout.to_json()?);
        } else {
            display_layout(&formatter, &layout);
            formatter.blank_line();
            formatter.success("Dry run completed successfully");
            formatter.info(&format!("  Output would be: {}", config.output.display()));
        }
        return Ok(());
    }

    handle_output_overwrite(&config, &formatter).await?;
    PdfWriter::new().can_write(&config.output).await?;

    formatter.info(&format!("Merging {} page(s)...", collection.page_count()));
    let job = collection.begin_merge()?;
    let bar = if formatter.should_print() {
        ProgressBar::new(ProgressStyle::Bar)
    } else {
        ProgressBar::disabled()
    };
    let renderer = tokio::spawn(progress::follow(collection.progress(), bar));

    let result = job.run().await;
    renderer.await.ok();
    let output = result?;

    display_merge_statistics(&formatter, &output.statistics);

    let write_stats = PdfWriter::new()
        .save_bytes(&output.bytes, &config.output)
        .await?;

    formatter.success(&format!(
        "Created {} ({})",
        config.output.display(),
        write_stats.format_file_size()
    ));
    formatter.detail(
        "Write time",
        &format!("{:.2}s", write_stats.write_time.as_secs_f64()),
    );

    Ok(())
}

/// Read and upload every input, keeping the ones that pass validation.
///
/// Returns one slot per input, `None` where the upload was rejected, so edit
/// steps can keep using command-line numbering.
async fn upload_inputs(
    config: &Config,
    collection: &mut PageCollection,
    formatter: &OutputFormatter,
) -> Result<Vec<Option<DocumentId>>, PdfCollateError> {
    let reader = PdfReader::new();
    let (results, load_stats) = reader.load_all(&config.inputs, config.effective_jobs()).await;
    display_load_statistics(formatter, &load_stats);

    let mut inputs = Vec::with_capacity(results.len());
    for (path, result) in config.inputs.iter().zip(results) {
        let uploaded = match result {
            Ok(file) => collection.upload_batch([(file.name, file.bytes)]),
            Err(err) => {
                formatter.warning(&format!("Skipping {}: {err}", path.display()));
                inputs.push(None);
                continue;
            }
        };

        display_upload_report(formatter, &uploaded);
        inputs.push(uploaded.accepted.first().map(|(doc, _)| doc.id()));
    }

    if collection.is_empty() {
        return Err(PdfCollateError::NothingToMerge);
    }

    Ok(inputs)
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<(), PdfCollateError> {
    if !PdfWriter::new().exists(&config.output).await {
        return Ok(());
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PdfCollateError::output_exists(config.output.clone())),
        OverwriteMode::Prompt => {
            // Nobody to ask in quiet mode.
            if formatter.is_quiet() {
                return Err(PdfCollateError::output_exists(config.output.clone()));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                config.output.display()
            ));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| PdfCollateError::other(format!("Failed to read input: {err}")))?;

            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(PdfCollateError::Cancelled),
            }
        }
    }
}
