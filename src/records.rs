//! Conversation dumps: file discovery, CSV parsing and grouping by counterparty.
//!
//! A dump is a CSV file with the header `date,from,to,message`, one message
//! per row. Dates may be RFC 3339 (the offset is dropped and the local
//! wall-clock time kept), `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a
//! bare `YYYY-MM-DD`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use rayon::prelude::*;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::counter::FrequencyCounter;
use crate::error::{Error, Result};
use crate::tokenize::{TokenizeOptions, make_ngram_counter};

/// One message of a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub from: String,
    pub to: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    date: String,
    from: String,
    to: String,
    message: String,
}

///Parses the accepted date layouts into a naive timestamp.
/// # Example
/// ```
/// use chat_timeline::parse_timestamp;
/// let a = parse_timestamp("2020-05-01T21:30:00+02:00").unwrap();
/// let b = parse_timestamp("2020-05-01 21:30:00").unwrap();
/// assert_eq!(a, b);
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

///Returns `path` itself for a file, or every `.csv` below it for a directory, sorted.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    files
}

///Reads every message of one dump. Any malformed row fails the whole file.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Fields)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        let raw: RawRecord = row.deserialize(Some(&headers))?;
        let timestamp = parse_timestamp(&raw.date).ok_or_else(|| Error::Timestamp {
            path: path.to_path_buf(),
            line,
            value: raw.date.clone(),
        })?;
        records.push(Record {
            timestamp,
            from: raw.from,
            to: raw.to,
            message: raw.message,
        });
    }
    debug!("read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Messages per counterparty, each list sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouped {
    pub by_counterparty: BTreeMap<String, Vec<(NaiveDateTime, String)>>,
    /// Messages neither sent nor received by the owner (group chats).
    pub skipped: usize,
}

/// Files every message under the other participant of its one-to-one conversation with `owner`.
pub fn group_by_counterparty<I>(owner: &str, records: I) -> Grouped
where
    I: IntoIterator<Item = Record>,
{
    let mut grouped = Grouped::default();
    for record in records {
        let other = if record.to == owner {
            record.from
        } else if record.from == owner {
            record.to
        } else {
            grouped.skipped += 1;
            continue;
        };
        grouped
            .by_counterparty
            .entry(other)
            .or_default()
            .push((record.timestamp, record.message));
    }
    for messages in grouped.by_counterparty.values_mut() {
        messages.sort_by_key(|(ts, _)| *ts);
    }
    if grouped.skipped > 0 {
        warn!(
            "skipped {} messages not exchanged with {}",
            grouped.skipped, owner
        );
    }
    grouped
}

/// Parallel per-entity sequences ready for binning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversations {
    pub names: Vec<String>,
    pub dates: Vec<Vec<NaiveDateTime>>,
    pub counters: Vec<Vec<FrequencyCounter>>,
}

impl Conversations {
    /// Tokenizes every message into an n-gram counter.
    pub fn from_grouped(grouped: &Grouped, ngram: usize, opts: TokenizeOptions) -> Result<Self> {
        let entities: Vec<(&String, &Vec<(NaiveDateTime, String)>)> =
            grouped.by_counterparty.iter().collect();
        let tokenized = entities
            .par_iter()
            .map(|(_, messages)| {
                messages
                    .iter()
                    .map(|(_, text)| make_ngram_counter(ngram, text, opts))
                    .collect::<Result<Vec<FrequencyCounter>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Conversations {
            names: entities.iter().map(|(name, _)| (*name).clone()).collect(),
            dates: entities
                .iter()
                .map(|(_, messages)| messages.iter().map(|(ts, _)| *ts).collect())
                .collect(),
            counters: tokenized,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.dates.iter().all(Vec::is_empty)
    }
}
