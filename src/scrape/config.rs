use std::path::PathBuf;
use std::time::Duration;

use crate::detail::DetailConfig;
use crate::export::ExportMode;
use crate::extract::ParseFailurePolicy;
use crate::listing::ListingConfig;

use super::RunCmd;

const DEFAULT_BASE_URL: &str = "https://egpuganda.go.ug";

#[derive(Clone, Debug, Default)]
pub struct ExportSettings {
    pub mode: ExportMode,
    /// Explicit output path; a timestamped name in the working directory otherwise.
    pub out: Option<PathBuf>,
    pub report: bool,
}

#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub listing: ListingConfig,
    pub detail: DetailConfig,
    pub detail_delay: Duration,
    pub date_failure: ParseFailurePolicy,
    pub export: ExportSettings,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            listing: ListingConfig::default(),
            detail: DetailConfig::default(),
            detail_delay: Duration::from_secs(1),
            date_failure: ParseFailurePolicy::default(),
            export: ExportSettings::default(),
        }
    }
}

impl ScrapeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Defaults overlaid with whatever `lookup` knows; unparseable numbers are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(base) = lookup("EGP_BASE_URL").filter(|s| !s.trim().is_empty()) {
            cfg.base_url = base.trim().to_string();
        }
        if let Some(parsed) = lookup("EGP_MAX_PAGES").and_then(|v| v.trim().parse::<u32>().ok()) {
            cfg.listing.max_pages = parsed;
        }
        if let Some(parsed) = lookup("EGP_DETAIL_ATTEMPTS").and_then(|v| v.trim().parse::<u32>().ok()) {
            cfg.detail.retry.attempts = parsed.max(1);
        }
        if let Some(parsed) = lookup("EGP_BACKOFF_BASE").and_then(|v| v.trim().parse::<u32>().ok()) {
            cfg.detail.retry.backoff_base = parsed;
        }
        cfg
    }

    pub fn apply_cli(&mut self, args: &RunCmd) {
        if let Some(v) = &args.base_url { self.base_url = v.clone(); }
        if let Some(v) = args.strategy { self.listing.strategy = v; }
        if let Some(v) = args.max_pages { self.listing.max_pages = v; }
        if let Some(v) = args.page_size { self.listing.page_size = v.max(1); }
        if let Some(v) = args.sort_column { self.listing.sort_column = v; }
        if let Some(v) = &args.sort_dir { self.listing.sort_dir = v.clone(); }
        if let Some(ms) = args.page_delay_ms { self.listing.page_delay = Duration::from_millis(ms); }
        if let Some(ms) = args.detail_delay_ms { self.detail_delay = Duration::from_millis(ms); }
        if let Some(s) = args.detail_timeout_secs { self.detail.timeout = Duration::from_secs(s); }
        if let Some(v) = args.attempts { self.detail.retry.attempts = v.max(1); }
        if let Some(v) = args.backoff_base { self.detail.retry.backoff_base = v; }
        if let Some(v) = args.date_failure { self.date_failure = v; }
        if let Some(v) = args.mode { self.export.mode = v; }
        if let Some(p) = &args.out { self.export.out = Some(p.clone()); }
        if args.report { self.export.report = true; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingStrategy;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunCmd,
    }

    #[test]
    fn defaults_match_portal_habits() {
        let cfg = ScrapeConfig::default();
        assert_eq!(cfg.detail.retry.attempts, 3);
        assert_eq!(cfg.detail.retry.backoff_base, 2);
        assert_eq!(cfg.detail.timeout, Duration::from_secs(30));
        assert_eq!(cfg.listing.page_delay, Duration::from_secs(1));
        assert_eq!(cfg.date_failure, ParseFailurePolicy::KeepOriginal);
        assert_eq!(cfg.export.mode, ExportMode::Raw);
    }

    #[test]
    fn env_overlay_ignores_garbage() {
        let cfg = ScrapeConfig::from_lookup(|k| match k {
            "EGP_BASE_URL" => Some("http://localhost:9000".into()),
            "EGP_MAX_PAGES" => Some("12".into()),
            "EGP_DETAIL_ATTEMPTS" => Some("lots".into()),
            "EGP_BACKOFF_BASE" => Some(" 3 ".into()),
            _ => None,
        });
        assert_eq!(cfg.base_url, "http://localhost:9000");
        assert_eq!(cfg.listing.max_pages, 12);
        assert_eq!(cfg.detail.retry.attempts, 3);
        assert_eq!(cfg.detail.retry.backoff_base, 3);
    }

    #[test]
    fn cli_flags_win() {
        let h = Harness::parse_from([
            "egp", "--strategy", "html-table", "--attempts", "1", "--mode", "web-app-ready",
            "--date-failure", "empty-default", "--page-delay-ms", "0", "--report",
        ]);
        let mut cfg = ScrapeConfig::default();
        cfg.apply_cli(&h.run);
        assert_eq!(cfg.listing.strategy, ListingStrategy::HtmlTable);
        assert_eq!(cfg.detail.retry.attempts, 1);
        assert_eq!(cfg.export.mode, ExportMode::WebAppReady);
        assert_eq!(cfg.date_failure, ParseFailurePolicy::EmptyDefault);
        assert!(cfg.listing.page_delay.is_zero());
        assert!(cfg.export.report);
    }
}
