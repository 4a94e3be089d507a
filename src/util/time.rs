use chrono::{DateTime, Local, SecondsFormat};

// Extraction timestamp stamped on every record, local time, RFC3339.
pub fn now_iso() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

// File-name slug like "20250821_143658".
pub fn file_stamp<Tz: chrono::TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y%m%d_%H%M%S").to_string()
}

pub fn file_stamp_now() -> String {
    file_stamp(&Local::now())
}
