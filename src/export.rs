//! Flat exports of a binned timeline: JSON for the visualization, CSV/TSV
//! tables of bin totals, and a plain-text report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};

use crate::binning::Binned;
use crate::counter::FrequencyCounter;
use crate::error::{Error, Result};
use crate::filter::FilterConfig;

/// Number of tokens listed per bin in the text report.
const TXT_TOP_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
    Tsv,
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Txt => "txt",
        }
    }
}

/// Everything the visualization needs, indexed `[entity][bin]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineExport {
    pub names: Vec<String>,
    /// Filtered (and possibly top-N reduced) words of each bin.
    pub words: Vec<Vec<FrequencyCounter>>,
    /// Unfiltered total of each bin.
    pub counts: Vec<Vec<u64>>,
    /// Bin boundaries as `%Y-%m-%d`.
    pub dates: Vec<String>,
}

impl TimelineExport {
    /// `names[e]` labels `binned.series[e]`.
    pub fn new(
        names: Vec<String>,
        binned: &Binned,
        filter: &FilterConfig,
        top: Option<usize>,
    ) -> Result<Self> {
        if names.len() != binned.series.len() {
            return Err(Error::InvalidArgument(format!(
                "{} names for {} series",
                names.len(),
                binned.series.len()
            )));
        }
        let dates = binned
            .range
            .dates()?
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        let counts = binned
            .series
            .iter()
            .map(|series| series.iter().map(FrequencyCounter::total).collect())
            .collect();
        let words = binned
            .series
            .iter()
            .map(|series| {
                series
                    .iter()
                    .map(|bin| {
                        let kept = if filter.is_noop() {
                            bin.clone()
                        } else {
                            filter.apply(bin)
                        };
                        match top {
                            Some(n) => kept.truncated_to_top(n),
                            None => kept,
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(TimelineExport {
            names,
            words,
            counts,
            dates,
        })
    }
}

///Neutralizes spreadsheet formula injection by prefixing `'` to cells starting with `= + - @`, tab or CR.
pub fn csv_safe_cell(cell: String) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell,
    }
}

fn write_table<W: Write>(export: &TimelineExport, delimiter: u8, out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);
    let mut header = vec!["name".to_string()];
    header.extend(export.dates.iter().cloned().map(csv_safe_cell));
    wtr.write_record(&header)?;
    for (name, counts) in export.names.iter().zip(&export.counts) {
        let mut row = vec![csv_safe_cell(name.clone())];
        row.extend(counts.iter().map(u64::to_string));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

///Human-readable report: one block per entity, one line per non-empty bin.
///Bin `i` is labeled with the window it covers, `dates[i-1] .. dates[i]` (end exclusive).
pub fn render_txt(export: &TimelineExport) -> String {
    let label = |k: Option<usize>| k.and_then(|k| export.dates.get(k)).map_or("", String::as_str);
    let mut out = String::new();
    for ((name, words), counts) in export.names.iter().zip(&export.words).zip(&export.counts) {
        let total: u64 = counts.iter().sum();
        out.push_str(&format!("== {name} ({total} words) ==\n"));
        for (i, (bin, count)) in words.iter().zip(counts).enumerate() {
            if *count == 0 {
                continue;
            }
            let (start, end) = (label(i.checked_sub(1)), label(Some(i)));
            let mut top = bin.top_n(TXT_TOP_WORDS);
            top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let listed: Vec<String> = top.iter().map(|(w, c)| format!("{w} ({c})")).collect();
            out.push_str(&format!("{start} .. {end}  {count:>6}  {}\n", listed.join(", ")));
        }
        out.push('\n');
    }
    out
}

///Writes `export` to `path` in the given format.
pub fn write_export(export: &TimelineExport, format: ExportFormat, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Json => serde_json::to_writer(&mut out, export)?,
        ExportFormat::Csv => write_table(export, b',', &mut out)?,
        ExportFormat::Tsv => write_table(export, b'\t', &mut out)?,
        ExportFormat::Txt => out.write_all(render_txt(export).as_bytes())?,
    }
    out.flush()?;
    info!(
        "wrote {} entities x {} bins to {}",
        export.names.len(),
        export.dates.len(),
        path.display()
    );
    Ok(())
}
