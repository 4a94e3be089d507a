use serde::Serialize;

const MAX_SAMPLES: usize = 3;

// Cells spreadsheet and dataframe importers read as missing.
const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_blank(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || NA_TOKENS.contains(&v)
}

/// Invisible or layout-breaking characters: controls, every separator except
/// the ASCII space, and Unicode format characters.
fn is_non_printable(c: char) -> bool {
    c.is_control()
        || (c.is_whitespace() && c != ' ')
        || matches!(
            c,
            '\u{ad}'
                | '\u{600}'..='\u{605}'
                | '\u{61c}'
                | '\u{6dd}'
                | '\u{70f}'
                | '\u{180e}'
                | '\u{200b}'..='\u{200f}'
                | '\u{202a}'..='\u{202e}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{206f}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
        )
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldFinding {
    pub field: String,
    pub missing_column: bool,
    pub blank: usize,
    /// 1-based data row numbers of the first blank values.
    pub sample_rows: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NonPrintable {
    pub column: String,
    pub rows: usize,
    pub first_row: usize,
    pub chars: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CsvFindings {
    pub utf8_valid: bool,
    pub rows: usize,
    pub columns: usize,
    pub cr_count: usize,
    pub required: Vec<FieldFinding>,
    pub non_printable: Vec<NonPrintable>,
}

impl CsvFindings {
    pub fn is_clean(&self) -> bool {
        self.utf8_valid
            && self.cr_count == 0
            && self.non_printable.is_empty()
            && self.required.iter().all(|f| !f.missing_column && f.blank == 0)
    }
}

/// Inspect raw CSV bytes. Invalid UTF-8 is reported and decoded lossily so the
/// remaining checks still run.
pub fn inspect(bytes: &[u8], required: &[String]) -> Result<CsvFindings, csv::Error> {
    let utf8_valid = std::str::from_utf8(bytes).is_ok();
    let text = String::from_utf8_lossy(bytes);
    let cr_count = text.bytes().filter(|b| *b == b'\r').count();

    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut required_findings: Vec<FieldFinding> = required
        .iter()
        .map(|f| FieldFinding { field: f.clone(), missing_column: !headers.contains(f), ..FieldFinding::default() })
        .collect();
    let required_idx: Vec<Option<usize>> = required.iter().map(|f| headers.iter().position(|h| h == f)).collect();
    let mut odd: Vec<Option<NonPrintable>> = vec![None; headers.len()];

    let mut rows = 0usize;
    for rec in rdr.records() {
        let rec = rec?;
        rows += 1;

        for (finding, idx) in required_findings.iter_mut().zip(&required_idx) {
            let Some(i) = idx else { continue };
            if rec.get(*i).is_none_or(is_blank) {
                finding.blank += 1;
                if finding.sample_rows.len() < MAX_SAMPLES { finding.sample_rows.push(rows); }
            }
        }

        for (i, value) in rec.iter().enumerate().take(headers.len()) {
            let bad: Vec<char> = value.chars().filter(|c| is_non_printable(*c)).collect();
            if bad.is_empty() { continue; }
            let entry = odd[i].get_or_insert_with(|| NonPrintable {
                column: headers[i].clone(),
                first_row: rows,
                ..NonPrintable::default()
            });
            entry.rows += 1;
            for c in bad {
                let shown = c.escape_default().to_string();
                if !entry.chars.contains(&shown) { entry.chars.push(shown); }
            }
        }
    }

    Ok(CsvFindings {
        utf8_valid,
        rows,
        columns: headers.len(),
        cr_count,
        required: required_findings,
        non_printable: odd.into_iter().flatten().collect(),
    })
}
