//! CSV export of detail records, one row per bidder.
//!
//! The file is written with LF terminators, read back, and healed in place if
//! any CR-bearing terminator slipped through.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::detail::types::{DataSource, DetailRecord};
use crate::extract::text::normalize_newlines;
use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;

pub mod flatten;
pub mod line_endings;
pub mod report;
pub mod webapp;

pub use line_endings::LineEndingCheck;
pub use webapp::RejectedRow;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("not valid UTF-8: {0}")]
    Encoding(String),
    #[error("{remaining} CR terminator(s) still present in {path} after healing")]
    LineEndings { path: String, remaining: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMode {
    #[default]
    Raw,
    /// Drop rows missing import keys and flatten whitespace
    WebAppReady,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportMode::Raw => "raw",
            ExportMode::WebAppReady => "web-app-ready",
        }
    }

    pub fn default_file_name(&self, stamp: &str) -> String {
        match self {
            ExportMode::Raw => format!("egp_contracts_{stamp}.csv"),
            ExportMode::WebAppReady => format!("egp_contracts_import_{stamp}.csv"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub mode: ExportMode,
    pub path: PathBuf,
    pub report: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceBreakdown {
    pub detail_page: usize,
    pub main_list_fallback: usize,
    pub minimal_fallback: usize,
}

impl SourceBreakdown {
    fn of(records: &[DetailRecord]) -> Self {
        let mut b = Self::default();
        for r in records {
            match r.data_source {
                DataSource::DetailPage => b.detail_page += 1,
                DataSource::MainListFallback => b.main_list_fallback += 1,
                DataSource::MinimalFallback => b.minimal_fallback += 1,
            }
        }
        b
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub mode: ExportMode,
    pub records: usize,
    pub rows_written: usize,
    pub rejected: Vec<RejectedRow>,
    pub sources: SourceBreakdown,
    pub line_endings: LineEndingCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

fn write_rows(path: &Path, records: &[DetailRecord], mode: ExportMode) -> Result<(usize, Vec<RejectedRow>), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    wtr.write_record(flatten::COLUMNS)?;

    let mut written = 0usize;
    let mut rejected = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        for row in flatten::flatten(rec) {
            let row: Vec<String> = match mode {
                ExportMode::Raw => row.iter().map(|f| normalize_newlines(f)).collect(),
                ExportMode::WebAppReady => match webapp::prepare_row(i, row) {
                    Ok(r) => r,
                    Err(rej) => { rejected.push(rej); continue; }
                },
            };
            wtr.write_record(&row)?;
            written += 1;
        }
    }
    wtr.flush()?;
    Ok((written, rejected))
}

pub fn export(records: &[DetailRecord], opts: &ExportOptions) -> Result<ExportSummary, ExportError> {
    let log = telemetry::scrape();

    let (rows_written, rejected) = {
        let _s = log.span_kv(&ScrapePhase::Export, [("path", opts.path.display().to_string()), ("mode", opts.mode.as_str().to_string())]).entered();
        write_rows(&opts.path, records, opts.mode)?
    };
    for r in &rejected {
        log.warn_kv(
            &format!("🚫 rejected row for record {}: {}", r.record_index + 1, r.reasons.join(", ")),
            [("record", r.record_index.to_string()), ("reasons", r.reasons.join(","))],
        );
    }

    let line_endings = {
        let _s = log.span(&ScrapePhase::Heal).entered();
        line_endings::verify_and_heal(&opts.path)?
    };
    if line_endings.healed {
        log.info(format!("🔧 rewrote {} CR terminator(s) to LF", line_endings.cr_found));
    }

    let mut summary = ExportSummary {
        path: opts.path.clone(),
        mode: opts.mode,
        records: records.len(),
        rows_written,
        rejected,
        sources: SourceBreakdown::of(records),
        line_endings,
        report_path: None,
    };

    if opts.report {
        let _s = log.span(&ScrapePhase::Report).entered();
        let path = report::report_path(&opts.path);
        std::fs::write(&path, report::render(&summary))?;
        summary.report_path = Some(path);
    }

    log.info_kv("💾 export written", [("path", opts.path.display().to_string()), ("rows", rows_written.to_string())]);
    Ok(summary)
}
