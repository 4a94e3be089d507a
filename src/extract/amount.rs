use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Instrument label attached to any non-zero bid security.
pub const SECURITY_INSTRUMENT: &str = "Bank Guarantee or Letter of Credit or cashiers check or bank draft";

// Header cell text that sometimes leaks into the value column.
const SECURITY_HEADER: &str = "BID SECURITY";

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern"))
}

/// First number in a money string with currency markers, separators and `/=` removed.
/// `0.0` when there is none.
pub fn normalize_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return 0.0 };
    let cleaned = raw
        .replace("UGX", "")
        .replace("USD", "")
        .replace('$', "")
        .replace(',', "")
        .replace("/=", "");
    number_re()
        .find(cleaned.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Bid security amount and its instrument; the instrument only exists when the amount does.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SecurityTerms {
    pub amount: f64,
    pub instrument: Option<String>,
}

impl SecurityTerms {
    pub fn none() -> Self {
        Self { amount: 0.0, instrument: None }
    }

    pub fn from_amount(amount: f64) -> Self {
        if amount > 0.0 {
            Self { amount, instrument: Some(SECURITY_INSTRUMENT.to_string()) }
        } else {
            Self::none()
        }
    }
}

pub fn security_terms(raw: Option<&str>) -> SecurityTerms {
    match raw.map(str::trim) {
        Some(v) if !v.is_empty() && v != SECURITY_HEADER => SecurityTerms::from_amount(normalize_amount(Some(v))),
        _ => SecurityTerms::none(),
    }
}
