use serde::Serialize;

use super::flatten::column_index;
use crate::extract::{collapse_whitespace, NOT_AVAILABLE};

pub const REQUIRED: [&str; 3] = ["reference_number", "subject", "provider"];

/// A flattened row left out of a web-app import file, with why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub record_index: usize,
    pub reference_number: String,
    pub reasons: Vec<String>,
}

/// Collapse whitespace in every field, then check the required ones. A blank
/// value or the not-available marker counts as missing.
pub fn prepare_row(record_index: usize, row: Vec<String>) -> Result<Vec<String>, RejectedRow> {
    let row: Vec<String> = row.iter().map(|f| collapse_whitespace(f)).collect();
    let reasons: Vec<String> = REQUIRED
        .iter()
        .filter(|name| column_index(name).and_then(|i| row.get(i)).is_none_or(|v| v.is_empty() || v == NOT_AVAILABLE))
        .map(|name| format!("missing {name}"))
        .collect();
    if reasons.is_empty() {
        return Ok(row);
    }
    let reference_number = column_index("reference_number").and_then(|i| row.get(i)).cloned().unwrap_or_default();
    Err(RejectedRow { record_index, reference_number, reasons })
}
