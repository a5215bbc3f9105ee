// src/main.rs
mod extractors;
mod pipeline;
mod source;
mod storage;
mod utils;
mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pipeline::{validate_toc_file, Pipeline, RunSummary};
use utils::config::Config;
use utils::AppError;

/// Command Line Interface for the TOC and content indexer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "application.yml")]
    config: PathBuf,

    /// Page text input: a form-feed separated file or a directory of page files
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSONL file of structured blocks from the extraction step
    #[arg(long)]
    blocks: Option<PathBuf>,

    /// Output directory for extracted content
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Document title written into every record
    #[arg(long)]
    doc_title: Option<String>,

    /// Only process the first N pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Number of concurrent page readers
    #[arg(long)]
    workers: Option<usize>,

    /// Debug mode - verbose logging and a per-line TOC trace
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the TOC and the content stream, then write all reports
    Run,
    /// Extract the TOC only
    Toc,
    /// Classify content only
    Content,
    /// Re-validate a written TOC file and print the report
    Validate {
        toc_file: PathBuf,

        /// Content JSONL used for the missing-page check
        #[arg(long)]
        content: Option<PathBuf>,

        /// Exit with an error when any defect is found
        #[arg(long)]
        fail_on_defects: bool,
    },
    /// Search classified content for a term
    Search {
        term: String,

        #[arg(long, default_value = "outputs/content.jsonl")]
        file: PathBuf,

        #[arg(long, default_value_t = 10)]
        max_results: usize,
    },
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(blocks) = &self.blocks {
            config.blocks_path = Some(blocks.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_directory = dir.clone();
        }
        if let Some(title) = &self.doc_title {
            config.doc_title = title.clone();
        }
        if self.max_pages.is_some() {
            config.max_pages = self.max_pages;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.debug);
    tracing::debug!("Starting with args: {:?}", args);

    match &args.command {
        Command::Validate { toc_file, content, fail_on_defects } => {
            let report = validate_toc_file(toc_file, content.as_deref())?;
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| AppError::Processing(format!("Cannot render report: {}", e)))?;
            println!("{}", json);

            if *fail_on_defects && !report.validation_passed {
                return Err(AppError::Processing(format!(
                    "{} defects found in {}",
                    report.defect_count(),
                    toc_file.display()
                )));
            }
            return Ok(());
        }
        Command::Search { term, file, max_results } => {
            let hits = storage::search_content(file, term, *max_results)?;
            if hits.is_empty() {
                println!("No matches for '{}'", term);
            }
            for hit in hits {
                println!("[line {} | page {} | {}] {}", hit.line, hit.page, hit.kind, hit.content);
            }
            return Ok(());
        }
        _ => {}
    }

    // 2. Load configuration, CLI flags win
    let mut config = Config::load(&args.config)?;
    args.apply_overrides(&mut config);
    config.validate()?;

    // 3. Run the requested pipeline
    let pipeline = Pipeline::new(config, args.debug)?;
    let summary = match args.command {
        Command::Run => pipeline.run_full().await?,
        Command::Toc => pipeline.run_toc().await?,
        Command::Content => pipeline.run_content().await?,
        Command::Validate { .. } | Command::Search { .. } => RunSummary::default(),
    };

    log_summary(&summary);
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        "Processing finished. Pages: {}, TOC entries: {}, content items: {}",
        summary.pages,
        summary.toc_entries,
        summary.content_items
    );
    if let Some(report) = &summary.report {
        if report.validation_passed {
            tracing::info!("Validation: PASS");
        } else {
            tracing::warn!("Validation: FAIL ({} defects)", report.defect_count());
        }
    }
}
