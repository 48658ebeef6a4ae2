#![forbid(unsafe_code)]
//! # Chat Timeline CLI
//!
//! Command-line interface for the `chat_timeline` crate. Reads CSV chat dumps
//! (`date,from,to,message`), keeps the one-to-one conversations of the given
//! owner address and writes a per-counterparty, per-interval word-frequency
//! matrix.
//!
//! ## Example
//! ```bash
//! cargo run --release -- me@example.com path/to/dumps --interval 7 --export-format csv
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) for progress output. See `--help` for all options.

use clap::Parser;
use log::{error, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

use chat_timeline::{
    DEFAULT_INTERVAL_DAYS, ExportFormat, FilterConfig, SummaryOptions, TokenizeOptions,
    load_stopwords, print_failed_files, summarize_conversations, write_export,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Address whose conversations are summarized
    owner: String,

    /// Dump file or directory of dumps (*.csv)
    path: String,

    /// Output file (default: <owner>_timeline.<format> in the current directory)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format for export (json, csv, tsv, txt)
    #[arg(long, default_value = "json")]
    export_format: ExportFormat,

    /// Bin width in days
    #[arg(long, default_value_t = DEFAULT_INTERVAL_DAYS)]
    interval: u32,

    /// Size of N for N-gram counting (1 = single words)
    #[arg(long, default_value_t = 1)]
    ngram: usize,

    /// Optional stopword file (whitespace-separated), removed from exported words
    #[arg(long)]
    stopwords: Option<String>,

    /// Drop exported words whose count in a bin is at or below this value
    #[arg(long, default_value_t = 0)]
    threshold: u64,

    /// Keep only the N most frequent words of every bin
    #[arg(long)]
    top: Option<usize>,

    /// Do not lower-case messages
    #[arg(long, default_value_t = false)]
    keep_case: bool,

    /// Do not strip ASCII punctuation from messages
    #[arg(long, default_value_t = false)]
    keep_punctuation: bool,
}

fn default_output(owner: &str, format: ExportFormat) -> PathBuf {
    let stem: String = owner
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    PathBuf::from(format!("{stem}_timeline.{}", format.extension()))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let excluded_tokens = match &cli.stopwords {
        Some(p) => match load_stopwords(p) {
            Ok(words) => words,
            Err(e) => {
                error!("Error reading stopwords {}: {}", p, e);
                process::exit(1);
            }
        },
        None => HashSet::new(),
    };

    let opts = SummaryOptions {
        ngram: cli.ngram,
        interval_days: cli.interval,
        tokenize: TokenizeOptions {
            fold_case: !cli.keep_case,
            strip_punctuation: !cli.keep_punctuation,
        },
        filter: FilterConfig {
            threshold: cli.threshold,
            excluded_tokens,
        },
        top: cli.top,
    };

    let summary = match summarize_conversations(&cli.owner, Path::new(&cli.path), &opts) {
        Ok(s) => s,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    };

    let output = cli
        .output
        .unwrap_or_else(|| default_output(&cli.owner, cli.export_format));
    if let Err(e) = write_export(&summary.export, cli.export_format, &output) {
        error!("Error writing {}: {}", output.display(), e);
        process::exit(1);
    }
    info!(
        "{} counterparties, {} bins, {} messages skipped",
        summary.export.names.len(),
        summary.binned.range.len(),
        summary.skipped_messages
    );
    println!("{}", output.display());

    if !summary.failed_files.is_empty() {
        print_failed_files(&summary.failed_files);
        process::exit(1);
    }
}
