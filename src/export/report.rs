use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::ExportSummary;

/// `<stem>_report.txt` next to the CSV.
pub fn report_path(csv: &Path) -> PathBuf {
    let stem = csv.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "export".to_string());
    csv.with_file_name(format!("{stem}_report.txt"))
}

pub fn render(summary: &ExportSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "EGP contracts export report");
    let _ = writeln!(out, "===========================");
    let _ = writeln!(out, "File: {}", summary.path.display());
    let _ = writeln!(out, "Mode: {}", summary.mode.as_str());
    let _ = writeln!(out, "Records: {}", summary.records);
    let _ = writeln!(out, "Rows written: {}", summary.rows_written);
    let _ = writeln!(out, "Rows rejected: {}", summary.rejected.len());
    for r in &summary.rejected {
        let reference = if r.reference_number.is_empty() { "-" } else { r.reference_number.as_str() };
        let _ = writeln!(out, "  record {} ({}): {}", r.record_index + 1, reference, r.reasons.join(", "));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Data sources:");
    let _ = writeln!(out, "  detail_page: {}", summary.sources.detail_page);
    let _ = writeln!(out, "  main_list_fallback: {}", summary.sources.main_list_fallback);
    let _ = writeln!(out, "  minimal_fallback: {}", summary.sources.minimal_fallback);
    let _ = writeln!(out, "Successful extractions: {}", summary.sources.detail_page);
    let _ = writeln!(out, "Fallback extractions: {}", summary.sources.main_list_fallback + summary.sources.minimal_fallback);
    let _ = writeln!(out);
    let _ = writeln!(out, "Compatibility checks:");
    let le = &summary.line_endings;
    if le.healed {
        let _ = writeln!(out, "  Line endings: {} CR terminator(s) found and rewritten to LF; {} remaining", le.cr_found, le.cr_after);
    } else {
        let _ = writeln!(out, "  Line endings: LF only");
    }
    let _ = writeln!(out, "  Encoding: UTF-8");
    out
}
