use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::detail::types::{Attachment, BidderEntry, BidderType, DataSource, DetailRecord};
use crate::extract::{
    canonical_method, canonical_status, classify_category, clean_html, clean_price, collapse_whitespace,
    normalize_amount, security_terms, DateNormalizer, NOT_AVAILABLE,
};
use crate::listing::types::SummaryRecord;

const UNSUCCESSFUL_HEADING: &str = "unsuccessful bidders";
const AUTHORISED_HEADING: &str = "authorised for display";
const DOCUMENT_EXTENSIONS: [&str; 8] = [".pdf", ".doc", ".docx", ".xls", ".xlsx", ".zip", ".rar", ".csv"];

#[derive(Clone, Copy)]
enum Field {
    Entity,
    Reference,
    Subject,
    Method,
    BestBidder,
    Price,
    Display,
    Removal,
    Closing,
    Evaluation,
    Award,
    BidFee,
    BidSecurity,
    ContactPerson,
    ContactPosition,
}

// First needle contained in the lowercased label wins.
const LABELS: [(&str, Field); 16] = [
    ("procurement entity", Field::Entity),
    ("procurement reference number", Field::Reference),
    ("subject of procurement", Field::Subject),
    ("method of procurement", Field::Method),
    ("name of best evaluated bidder", Field::BestBidder),
    ("total contract price", Field::Price),
    ("date for display", Field::Display),
    ("date for removal", Field::Removal),
    ("closing", Field::Closing),
    ("deadline", Field::Closing),
    ("evaluation", Field::Evaluation),
    ("award", Field::Award),
    ("bid fee", Field::BidFee),
    ("bid security", Field::BidSecurity),
    ("contact person", Field::ContactPerson),
    ("position", Field::ContactPosition),
];

/// Raw label/value text as found on the page, before any normalization.
#[derive(Debug, Default)]
struct RawDetail {
    entity: String,
    reference: String,
    subject: String,
    method: String,
    best_bidder: String,
    price: String,
    display_date: String,
    removal_date: String,
    closing_date: String,
    evaluation_date: String,
    award_date: String,
    bid_fee: String,
    bid_security: String,
    contact_person: String,
    contact_position: String,
    published_by: String,
    published_on: String,
    signed_by: String,
    unsuccessful: Vec<BidderEntry>,
    attachments: Vec<Attachment>,
}

impl RawDetail {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Entity => &mut self.entity,
            Field::Reference => &mut self.reference,
            Field::Subject => &mut self.subject,
            Field::Method => &mut self.method,
            Field::BestBidder => &mut self.best_bidder,
            Field::Price => &mut self.price,
            Field::Display => &mut self.display_date,
            Field::Removal => &mut self.removal_date,
            Field::Closing => &mut self.closing_date,
            Field::Evaluation => &mut self.evaluation_date,
            Field::Award => &mut self.award_date,
            Field::BidFee => &mut self.bid_fee,
            Field::BidSecurity => &mut self.bid_security,
            Field::ContactPerson => &mut self.contact_person,
            Field::ContactPosition => &mut self.contact_position,
        }
    }
}

fn sel(s: &str) -> Option<Selector> { Selector::parse(s).ok() }

fn cell_text(el: &ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

impl Field {
    // Needles broad enough to hit non-date labels ("Evaluation Methodology").
    fn needs_date_word(self) -> bool {
        matches!(self, Field::Closing | Field::Evaluation | Field::Award)
    }
}

fn label_field(label: &str) -> Option<Field> {
    let lower = label.to_lowercase();
    let dated = lower.contains("date") || lower.contains("deadline");
    LABELS
        .iter()
        .find(|(needle, f)| lower.contains(needle) && (dated || !f.needs_date_word()))
        .map(|(_, f)| *f)
}

fn label_value_rows(table: ElementRef) -> Vec<(String, String)> {
    let (Some(tr), Some(td)) = (sel("tr"), sel("td")) else { return Vec::new() };
    table
        .select(&tr)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row.select(&td).collect();
            if cells.len() < 2 { return None; }
            Some((cell_text(&cells[0]), cell_text(&cells[1])))
        })
        .collect()
}

/// Table that follows a heading whose text satisfies `is_heading`, in document order.
fn table_after_heading<'a>(doc: &'a Html, is_heading: impl Fn(&str) -> bool) -> Option<ElementRef<'a>> {
    let walk = sel("h3, table")?;
    let mut seen_heading = false;
    for el in doc.select(&walk) {
        match el.value().name() {
            "h3" if !seen_heading => seen_heading = is_heading(&cell_text(&el).to_lowercase()),
            "table" if seen_heading => return Some(el),
            _ => {}
        }
    }
    None
}

fn unsuccessful_bidders(table: ElementRef) -> Vec<BidderEntry> {
    let (Some(tr), Some(td)) = (sel("tr"), sel("td")) else { return Vec::new() };
    table
        .select(&tr)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&td).map(|c| cell_text(&c)).collect();
            if cells.len() < 6 { return None; }
            Some(BidderEntry {
                bidder_type: BidderType::Unsuccessful,
                name: cells[1].clone(),
                price: cells[2].clone(),
                rank: cells[3].clone(),
                evaluation_stage: cells[4].clone(),
                failure_reasons: cells[5].clone(),
            })
        })
        .collect()
}

fn is_document_link(href: &str) -> bool {
    let lower = href.to_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or("");
    DOCUMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) || lower.contains("/download")
}

fn attachments(doc: &Html, page_url: Option<&Url>) -> Vec<Attachment> {
    let Some(a) = sel("a[href]") else { return Vec::new() };
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for link in doc.select(&a) {
        let Some(href) = link.value().attr("href") else { continue };
        let href = href.trim();
        if href.is_empty() || !is_document_link(href) { continue; }
        let url = match page_url.and_then(|base| base.join(href).ok()) {
            Some(u) => u.to_string(),
            None => href.to_string(),
        };
        if !seen.insert(url.clone()) { continue; }
        let mut filename = cell_text(&link);
        if filename.is_empty() {
            filename = url.rsplit('/').next().unwrap_or("").to_string();
        }
        out.push(Attachment { filename, url });
    }
    out
}

fn scan(html: &str, page_url: Option<&Url>) -> RawDetail {
    let doc = Html::parse_document(html);
    let mut raw = RawDetail::default();

    if let Some(main) = sel("table.table-bordered").and_then(|s| doc.select(&s).next()) {
        for (label, value) in label_value_rows(main) {
            if let Some(field) = label_field(&label) {
                *raw.slot(field) = value;
            }
        }
    }

    if let Some(table) = table_after_heading(&doc, |h| h == UNSUCCESSFUL_HEADING) {
        raw.unsuccessful = unsuccessful_bidders(table);
    }

    if let Some(table) = table_after_heading(&doc, |h| h.contains(AUTHORISED_HEADING)) {
        for (label, value) in label_value_rows(table) {
            let lower = label.to_lowercase();
            if lower.contains("published by") { raw.published_by = value; }
            else if lower.contains("published on") { raw.published_on = value; }
            else if lower.contains("signed by") { raw.signed_by = value; }
        }
    }

    raw.attachments = attachments(&doc, page_url);
    raw
}

fn or_summary(found: String, summary: Option<&str>) -> String {
    if found.is_empty() { summary.unwrap_or("").to_string() } else { found }
}

/// Build a detail record from a successfully fetched page.
///
/// Labels absent from the page leave their field empty; subject, provider, date,
/// price and status fall back to the listing row when the page does not carry them.
pub fn parse_detail_page(
    html: &str,
    contract_url: &str,
    summary: Option<&SummaryRecord>,
    dates: &DateNormalizer,
    extraction_timestamp: String,
) -> DetailRecord {
    let page_url = Url::parse(contract_url).ok();
    let raw = scan(html, page_url.as_ref());

    let s_subject = summary.map(|s| clean_html(&s.subject));
    let s_provider = summary.map(|s| clean_html(&s.provider));
    let s_date = summary.map(|s| s.published_date.trim().to_string());
    let s_price = summary.map(|s| clean_price(&s.contract_price));
    let s_status = summary.map(|s| clean_html(&s.status));

    let mut rec = DetailRecord::empty(contract_url, extraction_timestamp, DataSource::DetailPage);
    rec.subject = or_summary(raw.subject, s_subject.as_deref());
    rec.provider = or_summary(s_provider.unwrap_or_default(), Some(raw.best_bidder.as_str()));
    rec.published_date = dates.normalize(&or_summary(raw.display_date, s_date.as_deref()));
    rec.contract_price = or_summary(raw.price, s_price.as_deref());
    rec.contract_value = normalize_amount(Some(&rec.contract_price));
    rec.status = canonical_status(s_status.as_deref().unwrap_or("")).as_str().to_string();
    rec.category = classify_category(&rec.subject).as_str().to_string();
    rec.procurement_entity = raw.entity;
    rec.reference_number = raw.reference;
    rec.method = canonical_method(&raw.method).as_str().to_string();
    rec.successful_bidder = raw.best_bidder;
    rec.removal_date = dates.normalize(&raw.removal_date);
    rec.closing_date = dates.normalize(&raw.closing_date);
    rec.evaluation_date = dates.normalize(&raw.evaluation_date);
    rec.award_date = dates.normalize(&raw.award_date);
    rec.bid_fee = normalize_amount(Some(&raw.bid_fee));
    rec.bid_security = security_terms(Some(&raw.bid_security));
    rec.contact_person = raw.contact_person;
    rec.contact_position = raw.contact_position;
    rec.attachments = raw.attachments;
    rec.published_by = raw.published_by;
    rec.published_on = raw.published_on;
    rec.signed_by = raw.signed_by;

    let mut bidders = Vec::with_capacity(raw.unsuccessful.len() + 1);
    if !rec.successful_bidder.is_empty() {
        let price = if rec.contract_price.is_empty() { NOT_AVAILABLE.to_string() } else { rec.contract_price.clone() };
        bidders.push(BidderEntry {
            bidder_type: BidderType::Successful,
            name: rec.successful_bidder.clone(),
            price,
            rank: "1".to_string(),
            evaluation_stage: "Passed All Stages".to_string(),
            failure_reasons: NOT_AVAILABLE.to_string(),
        });
    }
    bidders.extend(raw.unsuccessful);
    rec.bidders = bidders;
    rec
}
