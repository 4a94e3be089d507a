use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

/// What to hand back when none of the patterns parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ParseFailurePolicy {
    /// Trimmed input, unchanged.
    #[default]
    KeepOriginal,
    EmptyDefault,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePattern {
    /// `2025-08-21 02:36:58pm EAT`
    IsoDateTimeZone,
    /// `2025-08-21 14:36:58`
    IsoDateTime,
    /// `2025-08-21`
    IsoDate,
    /// `21-08-2025`
    DayMonthYear,
    /// `08-21-2025`
    MonthDayYear,
    /// `Sep-10 2025`
    AbbrevMonthDayYear,
    /// `Sep-10`, year taken from the normalizer
    AbbrevMonthDay,
}

pub const DEFAULT_PATTERNS: [DatePattern; 7] = [
    DatePattern::IsoDateTimeZone,
    DatePattern::IsoDateTime,
    DatePattern::IsoDate,
    DatePattern::DayMonthYear,
    DatePattern::MonthDayYear,
    DatePattern::AbbrevMonthDayYear,
    DatePattern::AbbrevMonthDay,
];

#[derive(Clone, Debug)]
pub struct DateNormalizer {
    pub patterns: Vec<DatePattern>,
    pub on_failure: ParseFailurePolicy,
    pub assumed_year: i32,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.to_vec(),
            on_failure: ParseFailurePolicy::default(),
            assumed_year: Utc::now().year(),
        }
    }
}

impl DateNormalizer {
    pub fn with_policy(on_failure: ParseFailurePolicy) -> Self {
        Self { on_failure, ..Self::default() }
    }

    /// First pattern that parses wins and is rendered `YYYY-MM-DD`.
    pub fn normalize(&self, raw: &str) -> String {
        let s = raw.trim();
        if s.is_empty() { return String::new(); }
        for pat in &self.patterns {
            if let Some(d) = self.try_pattern(*pat, s) {
                return d.format("%Y-%m-%d").to_string();
            }
        }
        match self.on_failure {
            ParseFailurePolicy::KeepOriginal => s.to_string(),
            ParseFailurePolicy::EmptyDefault => String::new(),
        }
    }

    fn try_pattern(&self, pat: DatePattern, s: &str) -> Option<NaiveDate> {
        match pat {
            DatePattern::IsoDateTimeZone => {
                let (rest, zone) = s.rsplit_once(' ')?;
                if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) { return None; }
                let rest = strip_meridiem(rest.trim_end());
                NaiveDateTime::parse_from_str(rest, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date())
            }
            DatePattern::IsoDateTime => NaiveDateTime::parse_from_str(strip_meridiem(s), "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date()),
            DatePattern::IsoDate => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            DatePattern::DayMonthYear => NaiveDate::parse_from_str(s, "%d-%m-%Y").ok(),
            DatePattern::MonthDayYear => NaiveDate::parse_from_str(s, "%m-%d-%Y").ok(),
            DatePattern::AbbrevMonthDayYear => NaiveDate::parse_from_str(s, "%b-%d %Y").ok(),
            DatePattern::AbbrevMonthDay => {
                let with_year = format!("{s} {}", self.assumed_year);
                NaiveDate::parse_from_str(&with_year, "%b-%d %Y").ok()
            }
        }
    }
}

// The portal writes 12h clock digits with a 24h-looking layout; only the date matters.
fn strip_meridiem(s: &str) -> &str {
    let lower = s.to_ascii_lowercase();
    if lower.ends_with("am") || lower.ends_with("pm") {
        s[..s.len() - 2].trim_end()
    } else {
        s
    }
}
