//! # chat_timeline
//!
//! Turns one-to-one chat history into a shared timeline of word frequencies.
//! Every message becomes an n-gram [`FrequencyCounter`]; the counters of each
//! counterparty are then summed into fixed-width bins (14 days by default)
//! whose boundaries are shared by all counterparties, so their series can be
//! drawn side by side.
//!
//! ## Example
//! ```
//! use chrono::NaiveDate;
//! use chat_timeline::{TokenizeOptions, intervalize_words, make_ngram_counter};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(12, 0, 0).unwrap();
//! let opts = TokenizeOptions::default();
//! let dates = vec![vec![day(1), day(2)], vec![day(20)]];
//! let counters = vec![
//!     vec![
//!         make_ngram_counter(1, "See you soon", opts).unwrap(),
//!         make_ngram_counter(1, "soon!", opts).unwrap(),
//!     ],
//!     vec![make_ngram_counter(1, "hello", opts).unwrap()],
//! ];
//!
//! let binned = intervalize_words(&dates, &counters, 14).unwrap();
//! assert_eq!(binned.series[0].len(), binned.range.len());
//! assert_eq!(binned.series[1].len(), binned.range.len());
//! assert!(binned.series[0].iter().any(|bin| bin.get("soon") == 2));
//! ```

use std::io;
use std::path::Path;

use log::{info, warn};

pub mod binning;
pub mod counter;
pub mod error;
pub mod export;
pub mod filter;
pub mod interval;
pub mod records;
pub mod tokenize;

pub use binning::{Binned, BinnedSeries, DEFAULT_INTERVAL_DAYS, intervalize_words};
pub use counter::FrequencyCounter;
pub use error::{Error, Result};
pub use export::{ExportFormat, TimelineExport, csv_safe_cell, render_txt, write_export};
pub use filter::{FilterConfig, load_stopwords};
pub use interval::{
    ANCHOR_HOUR, IntervalRange, build_range, date_from_ordinal, day_ordinal, padded_interval,
};
pub use records::{
    Conversations, Grouped, Record, collect_files, group_by_counterparty, parse_timestamp,
    read_records,
};
pub use tokenize::{TokenizeOptions, make_ngram_counter, strip_punctuation};

/// Knobs of [`summarize_conversations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Words per token (1 = single words).
    pub ngram: usize,
    pub interval_days: u32,
    pub tokenize: TokenizeOptions,
    pub filter: FilterConfig,
    /// Keep only the N most frequent tokens of every bin in the export.
    pub top: Option<usize>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            ngram: 1,
            interval_days: DEFAULT_INTERVAL_DAYS,
            tokenize: TokenizeOptions::default(),
            filter: FilterConfig::default(),
            top: None,
        }
    }
}

/// Output of [`summarize_conversations`].
#[derive(Debug, Clone)]
pub struct Summary {
    pub export: TimelineExport,
    pub binned: Binned,
    /// Files that could not be read, with the reason. They were skipped.
    pub failed_files: Vec<(String, String)>,
    /// Messages that did not involve the owner.
    pub skipped_messages: usize,
}

///Reads every dump under `path`, keeps the conversations of `owner` and bins them.
///Unreadable files are skipped and reported in [`Summary::failed_files`].
pub fn summarize_conversations(owner: &str, path: &Path, opts: &SummaryOptions) -> Result<Summary> {
    if !path.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    let files = collect_files(path);
    info!("reading {} dump file(s) from {}", files.len(), path.display());

    let mut records = Vec::new();
    let mut failed_files = Vec::new();
    for file in &files {
        match read_records(file) {
            Ok(mut r) => records.append(&mut r),
            Err(e) => {
                warn!("skipping {}: {}", file.display(), e);
                failed_files.push((file.display().to_string(), e.to_string()));
            }
        }
    }

    let grouped = group_by_counterparty(owner, records);
    let conversations = Conversations::from_grouped(&grouped, opts.ngram, opts.tokenize)?;
    if conversations.is_empty() {
        let mut msg = format!("no messages exchanged with {owner} under {}", path.display());
        if !failed_files.is_empty() {
            let reasons: Vec<String> = failed_files
                .iter()
                .map(|(file, reason)| format!("{file}: {reason}"))
                .collect();
            msg.push_str(&format!(
                "; {} file(s) could not be read: {}",
                failed_files.len(),
                reasons.join("; ")
            ));
        }
        return Err(Error::InvalidArgument(msg));
    }
    info!(
        "{} counterparties, {} messages",
        conversations.names.len(),
        conversations.dates.iter().map(Vec::len).sum::<usize>()
    );

    let binned = intervalize_words(
        &conversations.dates,
        &conversations.counters,
        opts.interval_days,
    )?;
    let export = TimelineExport::new(conversations.names, &binned, &opts.filter, opts.top)?;
    Ok(Summary {
        export,
        binned,
        failed_files,
        skipped_messages: grouped.skipped,
    })
}

///Prints the files that were skipped, with the reason, to stderr.
pub fn print_failed_files(failed: &[(String, String)]) {
    eprintln!("\n{} file(s) could not be read:", failed.len());
    for (file, reason) in failed {
        eprintln!("  {file}: {reason}");
    }
}
