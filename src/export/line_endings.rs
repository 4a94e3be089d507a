use std::fs;
use std::path::Path;

use serde::Serialize;

use super::ExportError;
use crate::extract::text::normalize_newlines;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LineEndingCheck {
    /// CR-bearing terminators found on the first read.
    pub cr_found: usize,
    pub healed: bool,
    /// CR characters left after healing; always zero on success.
    pub cr_after: usize,
}

/// Number of line terminators that contain a carriage return (`\r\n` or bare `\r`).
pub fn count_cr_terminators(text: &str) -> usize {
    // Every CR starts exactly one such terminator.
    text.bytes().filter(|b| *b == b'\r').count()
}

fn read_utf8(path: &Path) -> Result<String, ExportError> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| ExportError::Encoding(format!("{}: {}", path.display(), e)))
}

/// Read the file back; if any CR terminators exist rewrite it with bare LF and check again.
pub fn verify_and_heal(path: &Path) -> Result<LineEndingCheck, ExportError> {
    let text = read_utf8(path)?;
    let cr_found = count_cr_terminators(&text);
    if cr_found == 0 {
        return Ok(LineEndingCheck::default());
    }

    fs::write(path, normalize_newlines(&text))?;
    let cr_after = count_cr_terminators(&read_utf8(path)?);
    if cr_after > 0 {
        return Err(ExportError::LineEndings { path: path.display().to_string(), remaining: cr_after });
    }
    Ok(LineEndingCheck { cr_found, healed: true, cr_after })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_crlf_and_bare_cr_once_each() {
        assert_eq!(count_cr_terminators("a\r\nb\rc\n"), 2);
        assert_eq!(count_cr_terminators("a\nb\n"), 0);
    }

    #[test]
    fn heals_mixed_terminators_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "h1,h2\r\n1,2\r3,4\n").unwrap();

        let check = verify_and_heal(&path).unwrap();
        assert_eq!(check, LineEndingCheck { cr_found: 2, healed: true, cr_after: 0 });
        assert_eq!(fs::read_to_string(&path).unwrap(), "h1,h2\n1,2\n3,4\n");
    }

    #[test]
    fn clean_file_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "h\nv\n").unwrap();
        assert_eq!(verify_and_heal(&path).unwrap(), LineEndingCheck::default());
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();
        assert!(matches!(verify_and_heal(&path), Err(ExportError::Encoding(_))));
    }
}
