use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderName, REFERER};
use serde::Serialize;
use thiserror::Error;

use crate::portal::FetchError;
use crate::session::AuthenticatedContext;
use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;

pub mod api;
pub mod table;
pub mod types;

pub use types::SummaryRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ListingStrategy {
    /// DataTables JSON endpoint
    #[default]
    TabularApi,
    /// Server-rendered listing table
    HtmlTable,
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("listing page returned HTTP {0}")]
    Status(u16),
    #[error("listing response is not valid JSON: {0}")]
    Decode(String),
}

#[derive(Clone, Debug)]
pub struct ListingConfig {
    pub strategy: ListingStrategy,
    pub max_pages: u32,
    pub page_size: u32,
    pub sort_column: u32,
    pub sort_dir: String,
    pub page_delay: Duration,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            strategy: ListingStrategy::default(),
            max_pages: 5,
            page_size: 100,
            sort_column: 2,
            sort_dir: "desc".to_string(),
            page_delay: Duration::from_secs(1),
        }
    }
}

async fn fetch_page(ctx: &AuthenticatedContext, cfg: &ListingConfig, page: u32) -> Result<Vec<SummaryRecord>, ListingError> {
    let client = &ctx.client;
    let resolve = |href: &str| client.resolve(href).ok();
    match cfg.strategy {
        ListingStrategy::TabularApi => {
            let req = api::PageRequest {
                draw: page,
                start: (page - 1).saturating_mul(cfg.page_size),
                length: cfg.page_size,
                sort_column: cfg.sort_column,
                sort_dir: cfg.sort_dir.clone(),
            };
            let form = api::build_form(&req, ctx.csrf_token.as_deref());
            let headers = [
                (HeaderName::from_static("x-requested-with"), "XMLHttpRequest".to_string()),
                (REFERER, client.resolve(table::LIST_PATH)?),
            ];
            let resp = client.post_form(&client.resolve(api::AJAX_PATH)?, &form, &headers).await?;
            if !resp.is_success() { return Err(ListingError::Status(resp.status)); }
            api::parse_rows(&resp.body, &resolve)
        }
        ListingStrategy::HtmlTable => {
            let url = client.resolve(table::LIST_PATH)?;
            let resp = client.get_query(&url, &[("page".to_string(), page.to_string())]).await?;
            if !resp.is_success() { return Err(ListingError::Status(resp.status)); }
            Ok(table::parse_rows(&resp.body, &resolve))
        }
    }
}

/// Summary records from pages 1..=max_pages in order.
///
/// Stops at the first empty page. A failing page ends the listing with what was
/// already collected; only a failure before anything was listed is an error.
pub async fn list(ctx: &mut AuthenticatedContext, cfg: &ListingConfig) -> Result<Vec<SummaryRecord>, ListingError> {
    let log = telemetry::scrape();

    if cfg.strategy == ListingStrategy::TabularApi {
        if let Err(e) = ctx.refresh_token(table::LIST_PATH).await {
            log.warn(format!("⚠️ could not refresh token from {}: {}", table::LIST_PATH, e));
        }
        if ctx.csrf_token.is_none() {
            log.warn("⚠️ no anti-forgery token for the listing endpoint; trying without it");
        }
    }

    let ctx: &AuthenticatedContext = ctx;
    paginate(cfg, move |page| fetch_page(ctx, cfg, page)).await
}

/// Page loop shared by both strategies: `page_delay` between fetches, none
/// before the first.
async fn paginate<F, Fut>(cfg: &ListingConfig, mut fetch: F) -> Result<Vec<SummaryRecord>, ListingError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<SummaryRecord>, ListingError>>,
{
    let log = telemetry::scrape();
    let mut all: Vec<SummaryRecord> = Vec::new();
    for page in 1..=cfg.max_pages {
        if page > 1 && !cfg.page_delay.is_zero() {
            tokio::time::sleep(cfg.page_delay).await;
        }
        let fetched = {
            let _s = log.span_kv(&ScrapePhase::ListPage, [("page", page.to_string())]).entered();
            fetch(page).await
        };
        match fetched {
            Ok(rows) if rows.is_empty() => {
                log.info(format!("📭 no more records on page {}", page));
                break;
            }
            Ok(rows) => {
                all.extend(rows.iter().cloned());
                log.page_summary(page, rows.len(), all.len());
            }
            Err(e) if all.is_empty() => return Err(e),
            Err(e) => {
                log.warn(format!("⚠️ page {} failed ({}); keeping {} record(s)", page, e, all.len()));
                break;
            }
        }
    }
    Ok(all)
}
