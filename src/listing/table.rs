use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::types::SummaryRecord;

pub const LIST_PATH: &str = "/best-evaluated-bidders";

fn detail_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/best-evaluated-bidder-notice-report/\d+|/bid/notice/\d+/details").expect("detail link pattern")
    })
}

fn cell_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Rows of the first table on a listing page. The header row is skipped and so
/// is any row without a recognizable detail link.
pub fn parse_rows(html: &str, resolve: &dyn Fn(&str) -> Option<String>) -> Vec<SummaryRecord> {
    let doc = Html::parse_document(html);
    let (Ok(table_sel), Ok(tr), Ok(td), Ok(a)) =
        (Selector::parse("table"), Selector::parse("tr"), Selector::parse("td"), Selector::parse("a[href]"))
    else {
        return Vec::new();
    };
    let Some(table) = doc.select(&table_sel).next() else { return Vec::new() };

    let mut out = Vec::new();
    for row in table.select(&tr).skip(1) {
        let cells: Vec<ElementRef> = row.select(&td).collect();
        if cells.len() < 5 { continue; }
        let link = row
            .select(&a)
            .filter_map(|el| el.value().attr("href"))
            .find(|href| detail_link_re().is_match(href))
            .and_then(|href| resolve(href.trim()));
        let Some(detail_url) = link.filter(|l| !l.is_empty()) else { continue };
        out.push(SummaryRecord {
            subject: cell_text(&cells[0]),
            provider: cell_text(&cells[1]),
            published_date: cell_text(&cells[2]),
            contract_price: cell_text(&cells[3]),
            status: cell_text(&cells[4]),
            detail_url: Some(detail_url),
        });
    }
    out
}
