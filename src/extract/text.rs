use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

/// Sentinel written for fields the portal did not give us.
pub const NOT_AVAILABLE: &str = "N/A";

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // e.g. "UNBS/SUPLS/2024-2025/00119"
    RE.get_or_init(|| Regex::new(r"([A-Z]+/[A-Z]+/\d{4}-\d{4}/\d+)").expect("reference pattern"))
}

fn company_res() -> &'static [Regex; 2] {
    static RES: OnceLock<[Regex; 2]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"([A-Z][A-Z\s&]+(?:LTD|LIMITED|CORP|CORPORATION|INC|INCORPORATED))")
                .expect("company suffix pattern"),
            Regex::new(r"([A-Z][A-Z\s&]+(?:GROUP|SERVICES|SOLUTIONS|TECHNOLOGIES))")
                .expect("company group pattern"),
        ]
    })
}

/// Text content of an HTML fragment with entities decoded, trimmed.
pub fn clean_html(fragment: &str) -> String {
    if fragment.trim().is_empty() { return String::new(); }
    let frag = Html::parse_fragment(fragment);
    let text: String = frag.root_element().text().collect();
    text.trim().to_string()
}

pub fn collapse_whitespace(s: &str) -> String {
    let mut buf = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                if !buf.is_empty() { buf.push(' '); }
                in_ws = true;
            }
        } else {
            buf.push(ch);
            in_ws = false;
        }
    }
    buf.trim().to_string()
}

/// Price cells arrive with newlines and runs of spaces; keep the text, tidy the spacing.
pub fn clean_price(price: &str) -> String {
    collapse_whitespace(price)
}

/// Reference number embedded in a subject line, or `N/A`.
pub fn extract_reference_number(subject: &str) -> String {
    reference_re()
        .captures(subject)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Best-effort company names found in free text, in pattern order, deduplicated.
pub fn extract_company_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for re in company_res() {
        for cap in re.captures_iter(text) {
            let Some(m) = cap.get(1) else { continue };
            let name = m.as_str().trim();
            if name.chars().count() > 5 && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Replace CRLF and bare CR with LF.
pub fn normalize_newlines(s: &str) -> String {
    if !s.contains('\r') { return s.to_string(); }
    s.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_html_strips_tags_and_entities() {
        assert_eq!(clean_html("<b>ACME &amp; SONS</b> LTD "), "ACME & SONS LTD");
        assert_eq!(clean_html(""), "");
        assert_eq!(clean_html("plain"), "plain");
    }

    #[test]
    fn collapse_whitespace_joins_lines() {
        assert_eq!(collapse_whitespace("  UGX\n 5,000,000 \t /= "), "UGX 5,000,000 /=");
    }

    #[test]
    fn reference_number_from_subject() {
        let subject = "UNBS/SUPLS/2024-2025/00119 Supply of Office Equipment";
        assert_eq!(extract_reference_number(subject), "UNBS/SUPLS/2024-2025/00119");
        assert_eq!(extract_reference_number("Supply of chairs"), NOT_AVAILABLE);
    }

    #[test]
    fn company_names_need_suffix_and_length() {
        let names = extract_company_names("bidders: ALPHA BUILDERS LTD and BETA GROUP, Z LTD");
        assert!(names.contains(&"ALPHA BUILDERS LTD".to_string()));
        assert!(names.contains(&"BETA GROUP".to_string()));
        assert!(!names.iter().any(|n| n == "Z LTD"));
    }

    #[test]
    fn newlines_normalize_to_lf() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
