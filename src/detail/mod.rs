//! Detail fetching with graceful degradation.
//!
//! `fetch_detail` never fails: every outcome is a `DetailRecord`, either parsed
//! from the detail page or synthesized from the listing row.

use std::time::Duration;

use async_trait::async_trait;

use crate::extract::DateNormalizer;
use crate::listing::types::SummaryRecord;
use crate::portal::{FetchError, PageResponse};
use crate::scrape::tally::ScrapeTally;
use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;
use crate::util::time::now_iso;

pub mod fallback;
pub mod page;
pub mod types;

pub use types::{DataSource, DetailRecord};

/// Anything that can fetch a detail page with a per-request timeout.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn get_page(&self, url: &str, timeout: Duration) -> Result<PageResponse, FetchError>;
}

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_BASE: u32 = 2;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub attempts: u32,
    pub backoff_base: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: DEFAULT_ATTEMPTS, backoff_base: DEFAULT_BACKOFF_BASE, backoff_unit: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `n` (0-based): `unit * base^n`.
    pub fn backoff(&self, n: u32) -> Duration {
        let factor = self.backoff_base.saturating_pow(n);
        self.backoff_unit.saturating_mul(factor)
    }
}

#[derive(Clone, Debug)]
pub struct DetailConfig {
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self { retry: RetryPolicy::default(), timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS) }
    }
}

enum Attempt {
    Page(String),
    Retry(String),
    GiveUp(String),
}

fn classify(result: Result<PageResponse, FetchError>) -> Attempt {
    match result {
        Ok(page) if page.status == 200 => Attempt::Page(page.body),
        Ok(page) if page.status == 500 => Attempt::Retry("500 server error".to_string()),
        Ok(page) => Attempt::GiveUp(format!("HTTP {}", page.status)),
        Err(e) => Attempt::Retry(e.to_string()),
    }
}

/// Fetch and parse one detail page, retrying transient failures and falling
/// back to the listing row (or a placeholder) when the page cannot be had.
pub async fn fetch_detail(
    source: &dyn DetailSource,
    url: &str,
    summary: Option<&SummaryRecord>,
    cfg: &DetailConfig,
    dates: &DateNormalizer,
    tally: &mut ScrapeTally,
) -> DetailRecord {
    let log = telemetry::scrape();
    let attempts = cfg.retry.attempts.max(1);

    for n in 0..attempts {
        let outcome = {
            let _s = log.span_kv(&ScrapePhase::FetchDetail, [("url", url.to_string()), ("attempt", (n + 1).to_string())]).entered();
            classify(source.get_page(url, cfg.timeout).await)
        };
        match outcome {
            Attempt::Page(body) => {
                let rec = page::parse_detail_page(&body, url, summary, dates, now_iso());
                tally.record(rec.data_source);
                log.info_kv("✅ detail page", [("url", url.to_string()), ("subject", rec.subject.clone())]);
                return rec;
            }
            Attempt::GiveUp(reason) => {
                log.warn_kv(&format!("❌ {} for {}", reason, url), [("url", url.to_string()), ("reason", reason.clone())]);
                break;
            }
            Attempt::Retry(reason) => {
                log.warn_kv(
                    &format!("⚠️ {} for {} (attempt {}/{})", reason, url, n + 1, attempts),
                    [("url", url.to_string()), ("reason", reason.clone()), ("attempt", (n + 1).to_string())],
                );
                if n + 1 < attempts {
                    let wait = cfg.retry.backoff(n);
                    log.info(format!("⏳ waiting {:?} before retry", wait));
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    let _s = log.span(&ScrapePhase::Fallback).entered();
    let rec = match summary {
        Some(s) => fallback::from_summary(url, s, dates, now_iso()),
        None => fallback::minimal(url, now_iso()),
    };
    tally.record(rec.data_source);
    log.info_kv("🔄 fallback", [("url", url.to_string()), ("data_source", rec.data_source.as_str().to_string())]);
    rec
}

/// Detail records for `summaries` in listing order, `delay` apart. Rows without
/// a detail link go straight to the listing-row fallback.
pub async fn fetch_all(
    source: &dyn DetailSource,
    summaries: &[SummaryRecord],
    cfg: &DetailConfig,
    delay: Duration,
    dates: &DateNormalizer,
    tally: &mut ScrapeTally,
) -> Vec<DetailRecord> {
    let log = telemetry::scrape();
    let mut records = Vec::with_capacity(summaries.len());
    for (i, summary) in summaries.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        log.info(format!("📄 Processing contract {}/{}", i + 1, summaries.len()));
        let rec = match summary.detail_url.as_deref() {
            Some(url) => fetch_detail(source, url, Some(summary), cfg, dates, tally).await,
            None => {
                let rec = fallback::from_summary("", summary, dates, now_iso());
                tally.record(rec.data_source);
                rec
            }
        };
        records.push(rec);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::types::BidderType;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays canned responses and records when each request arrived.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<PageResponse, FetchError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<PageResponse, FetchError>>) -> Self {
            Self { responses: Mutex::new(responses.into()), calls: Mutex::new(Vec::new()) }
        }

        fn call_count(&self) -> usize { self.calls.lock().unwrap().len() }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl DetailSource for ScriptedSource {
        async fn get_page(&self, url: &str, _timeout: Duration) -> Result<PageResponse, FetchError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(status(500, url)))
        }
    }

    fn status(code: u16, url: &str) -> PageResponse {
        PageResponse { status: code, url: url.to_string(), body: String::new() }
    }

    fn ok(body: &str) -> Result<PageResponse, FetchError> {
        Ok(PageResponse { status: 200, url: "u".into(), body: body.to_string() })
    }

    fn unbs_summary() -> SummaryRecord {
        SummaryRecord {
            subject: "UNBS/SUPLS/2024-2025/00119 Supply of Office Equipment".into(),
            provider: "ACME LTD".into(),
            published_date: "2025-08-21".into(),
            contract_price: "UGX 5,000,000".into(),
            status: String::new(),
            detail_url: None,
        }
    }

    fn fast_cfg(attempts: u32) -> DetailConfig {
        DetailConfig { retry: RetryPolicy { attempts, ..RetryPolicy::default() }, ..DetailConfig::default() }
    }

    #[test]
    fn backoff_grows_geometrically() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), Duration::from_secs(1));
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
        let p3 = RetryPolicy { backoff_base: 3, backoff_unit: Duration::from_millis(100), ..RetryPolicy::default() };
        assert_eq!(p3.backoff(2), Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_500_falls_back_to_listing_row() {
        let src = ScriptedSource::new(vec![]);
        let summary = unbs_summary();
        let mut tally = ScrapeTally::default();

        let rec = fetch_detail(&src, "https://egp.example/r/119", Some(&summary), &fast_cfg(3), &DateNormalizer::default(), &mut tally).await;

        assert_eq!(rec.data_source, DataSource::MainListFallback);
        assert!(rec.detail_extraction_failed);
        assert_eq!(rec.reference_number, "UNBS/SUPLS/2024-2025/00119");
        assert_eq!(rec.successful_bidder, "ACME LTD");
        assert!(!rec.bidders.is_empty());
        assert_eq!(rec.bidders[0].bidder_type, BidderType::Successful);
        assert_eq!(src.call_count(), 3);
        assert_eq!(tally, ScrapeTally { success_count: 0, fallback_count: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn waits_double_between_attempts() {
        let src = ScriptedSource::new(vec![Err(FetchError::Timeout), Err(FetchError::Request("reset".into()))]);
        let mut tally = ScrapeTally::default();

        fetch_detail(&src, "u", None, &fast_cfg(3), &DateNormalizer::default(), &mut tally).await;

        assert_eq!(src.gaps(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn other_status_skips_retries() {
        let src = ScriptedSource::new(vec![Ok(status(404, "u"))]);
        let mut tally = ScrapeTally::default();

        let rec = fetch_detail(&src, "u", Some(&unbs_summary()), &fast_cfg(3), &DateNormalizer::default(), &mut tally).await;

        assert_eq!(src.call_count(), 1);
        assert_eq!(rec.data_source, DataSource::MainListFallback);
    }

    #[tokio::test(start_paused = true)]
    async fn no_summary_gives_minimal_record() {
        let src = ScriptedSource::new(vec![Err(FetchError::Timeout)]);
        let mut tally = ScrapeTally::default();

        let rec = fetch_detail(&src, "u", None, &fast_cfg(1), &DateNormalizer::default(), &mut tally).await;

        assert_eq!(src.call_count(), 1);
        assert_eq!(rec.data_source, DataSource::MinimalFallback);
        assert_eq!(rec.bidders.len(), 1);
        assert_eq!(rec.bidders[0].bidder_type, BidderType::Unknown);
        assert_eq!(tally.fallback_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn details_are_spaced_by_delay() {
        let page = r#"<table class="table-bordered"><tr><td>Name of Best Evaluated Bidder</td><td>ACME LTD</td></tr></table>"#;
        let src = ScriptedSource::new(vec![ok(page), ok(page), ok(page)]);
        let summaries: Vec<SummaryRecord> = (1..=3)
            .map(|i| SummaryRecord { detail_url: Some(format!("https://egp.example/r/{i}")), ..unbs_summary() })
            .collect();
        let delay = Duration::from_millis(1500);
        let mut tally = ScrapeTally::default();
        let t0 = Instant::now();

        let recs = fetch_all(&src, &summaries, &fast_cfg(1), delay, &DateNormalizer::default(), &mut tally).await;

        assert_eq!(recs.len(), 3);
        assert_eq!(tally.success_count, 3);
        assert_eq!(src.call_count(), 3);
        assert_eq!(src.calls.lock().unwrap()[0] - t0, Duration::ZERO);
        assert!(src.gaps().iter().all(|g| *g >= delay));
    }

    #[tokio::test(start_paused = true)]
    async fn rows_without_link_skip_the_network() {
        let src = ScriptedSource::new(vec![]);
        let mut tally = ScrapeTally::default();

        let recs = fetch_all(&src, &[unbs_summary()], &fast_cfg(3), Duration::ZERO, &DateNormalizer::default(), &mut tally).await;

        assert_eq!(src.call_count(), 0);
        assert_eq!(recs[0].data_source, DataSource::MainListFallback);
        assert_eq!(recs[0].reference_number, "UNBS/SUPLS/2024-2025/00119");
        assert_eq!(tally.fallback_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_500() {
        let page = r#"<table class="table-bordered">
            <tr><td>Name of Best Evaluated Bidder</td><td>ACME LTD</td></tr>
            <tr><td>Procurement Reference Number</td><td>UNBS/SUPLS/2024-2025/00119</td></tr>
        </table>"#;
        let src = ScriptedSource::new(vec![Ok(status(500, "u")), ok(page)]);
        let mut tally = ScrapeTally::default();

        let rec = fetch_detail(&src, "https://egp.example/r/1", Some(&unbs_summary()), &fast_cfg(3), &DateNormalizer::default(), &mut tally).await;

        assert_eq!(rec.data_source, DataSource::DetailPage);
        assert!(!rec.detail_extraction_failed);
        assert_eq!(rec.successful_bidder, "ACME LTD");
        assert_eq!(src.call_count(), 2);
        assert_eq!(tally, ScrapeTally { success_count: 1, fallback_count: 0 });
    }
}
