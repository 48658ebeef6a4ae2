//! Integration tests for `chat_timeline`.
//
// This suite verifies:
// - Library behavior (record loading, grouping, binning invariants, filtering, exports)
// - CLI behavior including export formats, stopwords and failure exit codes
//
// Notes:
// - CLI tests run the binary with a per-process working directory (no global CWD change).

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use csv::WriterBuilder;
use predicates::prelude::*;
use regex::Regex;
use serde_json::Value as Json;
use tempfile::tempdir;

use chat_timeline::{
    ExportFormat, FilterConfig, FrequencyCounter, SummaryOptions, TimelineExport, csv_safe_cell,
    summarize_conversations, write_export,
};

// --------------------- helpers ---------------------

const ME: &str = "me@example.com";

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// Read file to string.
fn read_to_string<P: AsRef<Path>>(p: P) -> String {
    fs::read_to_string(p).unwrap()
}

/// A small dump: two counterparties with disjoint activity and one group message.
fn sample_dump() -> String {
    [
        "date,from,to,message",
        "2021-03-01 09:00:00,alice@x,me@example.com,Good morning! Coffee?",
        "2021-03-02T18:30:00,me@example.com,alice@x,coffee sounds good",
        "2021-03-20,alice@x,me@example.com,\"Coffee, again; tomorrow?\"",
        "2021-09-10 12:00:00+02:00,bob@y,me@example.com,=cmd|calc",
        "2021-09-11 12:00:00,me@example.com,bob@y,hi bob",
        "2021-09-11 12:05:00,bob@y,carol@z,not for me",
    ]
    .join("\n")
        + "\n"
}

/// Run CLI successfully with a specific working directory.
fn run_cli_ok_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("chat_timeline").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().success()
}

/// Run CLI expecting failure with a specific working directory.
fn run_cli_fail_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("chat_timeline").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().failure()
}

fn load_json(p: &Path) -> Json {
    serde_json::from_str(&read_to_string(p)).expect("valid json")
}

// --------------------- library tests ---------------------

#[test]
fn lib_summary_shares_one_axis() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());

    let s = summarize_conversations(ME, td.path(), &SummaryOptions::default()).unwrap();
    assert_eq!(s.export.names, vec!["alice@x", "bob@y"]);
    assert_eq!(s.skipped_messages, 1);
    assert!(s.failed_files.is_empty());

    let bins = s.export.dates.len();
    assert_eq!(bins, s.binned.range.len());
    assert!(s.export.words.iter().all(|w| w.len() == bins));
    assert!(s.export.counts.iter().all(|c| c.len() == bins));

    // alice is active in March, bob in September: the gap is zero for both
    let alice = &s.export.counts[0];
    let bob = &s.export.counts[1];
    let alice_last = alice.iter().rposition(|&c| c > 0).unwrap();
    let bob_first = bob.iter().position(|&c| c > 0).unwrap();
    assert!(alice_last < bob_first);

    // "good morning coffee" + "coffee sounds good" + "coffee again tomorrow"
    assert_eq!(alice.iter().sum::<u64>(), 9);
    let coffee: u64 = s.export.words[0].iter().map(|b| b.get("coffee")).sum();
    assert_eq!(coffee, 3);
}

#[test]
fn lib_dates_are_iso_and_evenly_spaced() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());

    let mut o = SummaryOptions::default();
    o.interval_days = 7;
    let s = summarize_conversations(ME, td.path(), &o).unwrap();

    let re = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    assert!(s.export.dates.iter().all(|d| re.is_match(d)));
    assert_eq!(s.export.dates[0], "2021-02-22");
    let b = s.binned.range.boundaries();
    assert!(b.windows(2).all(|w| w[1] - w[0] == 7));
}

#[test]
fn lib_punctuation_fuses_words() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(
        &td,
        "dump.csv",
        "date,from,to,message\n2022-01-01 10:00:00,me@example.com,dan@q,The end.Start over\n",
    );
    let s = summarize_conversations(ME, td.path(), &SummaryOptions::default()).unwrap();
    let total: FrequencyCounter = s.binned.series[0].iter().fold(FrequencyCounter::new(), |mut acc, b| {
        acc += b;
        acc
    });
    assert_eq!(total.get("endstart"), 1);
    assert_eq!(total.get("end"), 0);
}

#[test]
fn lib_bigrams_and_filters() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());

    let o = SummaryOptions {
        ngram: 2,
        filter: FilterConfig {
            threshold: 0,
            excluded_tokens: ["coffee sounds".to_string()].into_iter().collect(),
        },
        ..SummaryOptions::default()
    };
    let s = summarize_conversations(ME, td.path(), &o).unwrap();
    let words = &s.export.words[0];
    assert!(words.iter().any(|b| b.get("good morning") == 1));
    assert!(words.iter().all(|b| b.get("coffee sounds") == 0));
    // counts are unfiltered: 2 + 2 + 2 bigrams
    assert_eq!(s.export.counts[0].iter().sum::<u64>(), 6);
}

#[test]
fn lib_json_export_layout() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());
    let s = summarize_conversations(ME, td.path(), &SummaryOptions::default()).unwrap();

    let out = td.path().join("out.json");
    write_export(&s.export, ExportFormat::Json, &out).unwrap();
    let v = load_json(&out);
    for key in ["names", "words", "counts", "dates"] {
        assert!(v.get(key).is_some(), "missing key {key}");
    }
    let back: TimelineExport = serde_json::from_value(v).unwrap();
    assert_eq!(back, s.export);
}

#[test]
fn lib_failed_files_are_reported() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "good.csv", &sample_dump());
    write_file(&td, "broken.csv", "date,from,to,message\nnot-a-date,a,b,c\n");
    let s = summarize_conversations(ME, td.path(), &SummaryOptions::default()).unwrap();
    assert_eq!(s.failed_files.len(), 1);
    assert!(s.failed_files[0].1.contains("not-a-date"));
    assert_eq!(s.export.names.len(), 2);
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_nonexistent_path_fails() {
    let td = tempdir().unwrap();
    let bad = td.path().join("does_not_exist_here");
    run_cli_fail_in(td.path(), &[ME, bad.to_string_lossy().as_ref()]);
}

#[test]
fn cli_default_json_output() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());

    run_cli_ok_in(td.path(), &[ME, td.path().to_string_lossy().as_ref()])
        .stdout(predicate::str::contains("me_example_com_timeline.json"));

    let v = load_json(&td.path().join("me_example_com_timeline.json"));
    let names: Vec<&str> = v["names"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice@x", "bob@y"]);
    assert_eq!(
        v["dates"].as_array().unwrap().len(),
        v["counts"][0].as_array().unwrap().len()
    );
}

#[test]
fn cli_csv_export_sanitizes_names() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(
        &td,
        "dump.csv",
        "date,from,to,message\n2021-01-01 10:00:00,=evil,me@example.com,hello\n",
    );
    let out = td.path().join("table.csv");
    run_cli_ok_in(
        td.path(),
        &[
            ME,
            "dump.csv",
            "--export-format",
            "csv",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    let text = read_to_string(&out);
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("name,"));
    assert!(lines.next().unwrap().starts_with("'=evil,"));
}

#[test]
fn cli_tsv_and_txt_exports() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());

    let tsv = td.path().join("t.tsv");
    run_cli_ok_in(
        td.path(),
        &[ME, "dump.csv", "--export-format", "tsv", "-o", tsv.to_str().unwrap()],
    );
    let row = read_to_string(&tsv).lines().nth(1).unwrap().to_string();
    assert!(row.starts_with("alice@x\t"));

    let txt = td.path().join("t.txt");
    run_cli_ok_in(
        td.path(),
        &[ME, "dump.csv", "--export-format", "txt", "-o", txt.to_str().unwrap()],
    );
    let report = read_to_string(&txt);
    assert!(report.contains("== alice@x (9 words) =="));
    assert!(report.contains("coffee (2)"));
}

#[test]
fn cli_stopwords_threshold_and_top() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());
    let stop = write_file(&td, "stop.txt", "good\nCoffee\n");
    let out = td.path().join("o.json");

    run_cli_ok_in(
        td.path(),
        &[
            ME,
            "dump.csv",
            "--stopwords",
            stop.to_str().unwrap(),
            "--top",
            "1",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    let v = load_json(&out);
    let export: TimelineExport = serde_json::from_value(v).unwrap();
    for bin in &export.words[0] {
        assert_eq!(bin.get("coffee"), 0);
        assert_eq!(bin.get("good"), 0);
        assert!(bin.len() <= 1);
    }
    assert_eq!(export.counts[0].iter().sum::<u64>(), 9);
}

#[test]
fn cli_missing_stopword_file_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());
    run_cli_fail_in(td.path(), &[ME, "dump.csv", "--stopwords", "nope.txt"]);
}

#[test]
fn cli_zero_interval_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "dump.csv", &sample_dump());
    run_cli_fail_in(td.path(), &[ME, "dump.csv", "--interval", "0"]);
}

#[test]
fn cli_bad_file_still_exports_but_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "a.csv", &sample_dump());
    write_file(&td, "b.csv", "date,from,to,message\nwhenever,a,b,c\n");
    let out = td.path().join("o.json");

    run_cli_fail_in(
        td.path(),
        &[ME, td.path().to_string_lossy().as_ref(), "-o", out.to_str().unwrap()],
    )
    .stderr(predicate::str::contains("b.csv"));
    assert!(out.exists());
}

#[test]
fn cli_all_files_unreadable_names_them() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "broken.csv", "date,from,to,message\nsomeday,bob,me@example.com,hi\n");

    run_cli_fail_in(td.path(), &[ME, td.path().to_string_lossy().as_ref()])
        .stderr(predicate::str::contains("broken.csv").and(predicate::str::contains("someday")));
}

// --- Tests to verify sanitizing works ---

#[test]
fn csv_writer_sanitizes_and_quotes_correctly() {
    let mut buf = Vec::new();
    {
        let mut wtr = WriterBuilder::new().from_writer(&mut buf);
        wtr.write_record(["name", "2021-01-01"]).unwrap();

        // dangerous: starts with '=' and contains quotes
        let dangerous = r#"=HYPERLINK("http://x")"#.to_string();
        wtr.write_record([csv_safe_cell(dangerous), "1".to_string()])
            .unwrap();
        wtr.flush().unwrap();
    }

    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("'=HYPERLINK"), "CSV must prefix '=' at start of cell");
    assert!(
        out.contains(r#"'=HYPERLINK(""http://x"")"#),
        "inner quotes should be escaped (doubled)"
    );
}

#[test]
fn no_double_prefix_when_cell_already_safe() {
    let already_safe = "'@SAFE".to_string();
    assert_eq!(csv_safe_cell(already_safe.clone()), already_safe);

    let normal = "alice@x".to_string();
    assert_eq!(csv_safe_cell(normal.clone()), normal);
}
