use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use crate::detail;
use crate::export::{self, ExportMode, ExportOptions, ExportSummary};
use crate::extract::{DateNormalizer, ParseFailurePolicy};
use crate::listing::{self, ListingStrategy};
use crate::portal::PortalClient;
use crate::session::{self, Credentials, LoginDetector, MarkerDetector};
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::util::time::file_stamp_now;

pub mod config;
pub mod credentials;
pub mod tally;

pub use config::ScrapeConfig;
pub use tally::ScrapeTally;

#[derive(Args, Debug, Default)]
pub struct RunCmd {
    /// Portal root, e.g. https://egpuganda.go.ug
    #[arg(long)] pub base_url: Option<String>,
    #[arg(long, value_enum)] pub strategy: Option<ListingStrategy>,
    #[arg(long)] pub max_pages: Option<u32>,
    #[arg(long)] pub page_size: Option<u32>,
    #[arg(long)] pub sort_column: Option<u32>,
    #[arg(long)] pub sort_dir: Option<String>,
    #[arg(long)] pub page_delay_ms: Option<u64>,
    #[arg(long)] pub detail_delay_ms: Option<u64>,
    #[arg(long)] pub detail_timeout_secs: Option<u64>,
    /// Detail fetch attempts before falling back
    #[arg(long)] pub attempts: Option<u32>,
    #[arg(long)] pub backoff_base: Option<u32>,
    #[arg(long, value_enum)] pub date_failure: Option<ParseFailurePolicy>,
    #[arg(long, value_enum)] pub mode: Option<ExportMode>,
    #[arg(long)] pub out: Option<PathBuf>,
    /// Also write <stem>_report.txt next to the CSV
    #[arg(long, default_value_t = false)] pub report: bool,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub listed: usize,
    pub tally: ScrapeTally,
    pub export: ExportSummary,
}

pub async fn run(args: RunCmd) -> Result<()> {
    let log = telemetry::scrape();
    let mut cfg = ScrapeConfig::from_env();
    cfg.apply_cli(&args);

    let run_id = Uuid::new_v4().to_string();
    let _g = log.root_span_kv([
        ("run_id", run_id.clone()),
        ("base_url", cfg.base_url.clone()),
        ("strategy", format!("{:?}", cfg.listing.strategy)),
        ("max_pages", cfg.listing.max_pages.to_string()),
        ("attempts", cfg.detail.retry.attempts.to_string()),
        ("mode", cfg.export.mode.as_str().to_string()),
    ]).entered();
    let t0 = Instant::now();

    let creds = credentials::resolve(|k| std::env::var(k).ok(), credentials::prompt_stdin)
        .context("credentials")?;
    let report = scrape_with(&cfg, &creds, &MarkerDetector::default()).await?;

    if telemetry::config::json_mode() {
        log.result(&report, Some(Meta { duration_ms: Some(t0.elapsed().as_millis()), run_id: Some(run_id) }))?;
    }
    Ok(())
}

/// Login, list, fetch each detail (with fallback) and export. Only a failed
/// login aborts; listing trouble leaves fewer records, never an error.
pub async fn scrape_with(cfg: &ScrapeConfig, creds: &Credentials, detector: &dyn LoginDetector) -> Result<RunReport> {
    let log = telemetry::scrape();

    let client = PortalClient::new(&cfg.base_url).context("portal client")?;
    let mut ctx = session::authenticate(client, creds, detector).await.context("login failed")?;

    let summaries = match listing::list(&mut ctx, &cfg.listing).await {
        Ok(rows) => rows,
        Err(e) => {
            log.error(format!("❌ could not list contracts: {}", e));
            Vec::new()
        }
    };
    if summaries.is_empty() {
        log.warn("⚠️ no contracts found");
    }

    let dates = DateNormalizer::with_policy(cfg.date_failure);
    let mut tally = ScrapeTally::default();
    let records = detail::fetch_all(&ctx.client, &summaries, &cfg.detail, cfg.detail_delay, &dates, &mut tally).await;

    let path = cfg
        .export
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(cfg.export.mode.default_file_name(&file_stamp_now())));
    let opts = ExportOptions { mode: cfg.export.mode, path, report: cfg.export.report };
    let summary = export::export(&records, &opts).with_context(|| format!("writing {}", opts.path.display()))?;

    log.totals(tally.total(), tally.success_count, tally.fallback_count, summary.rows_written, summary.rejected.len());
    Ok(RunReport { listed: summaries.len(), tally, export: summary })
}
