use crate::detail::types::{BidderEntry, BidderType, DataSource, DetailRecord};
use crate::extract::text::{extract_company_names, extract_reference_number};
use crate::extract::{
    canonical_status, classify_category, clean_html, clean_price, normalize_amount, DateNormalizer, NOT_AVAILABLE,
};
use crate::listing::types::SummaryRecord;

fn na() -> String { NOT_AVAILABLE.to_string() }

/// Record derived from the listing row alone, used when the detail page is unreachable.
pub fn from_summary(
    contract_url: &str,
    summary: &SummaryRecord,
    dates: &DateNormalizer,
    extraction_timestamp: String,
) -> DetailRecord {
    let subject = clean_html(&summary.subject);
    let provider = clean_html(&summary.provider);
    let price = clean_price(&summary.contract_price);

    let mut rec = DetailRecord::empty(contract_url, extraction_timestamp, DataSource::MainListFallback);
    rec.reference_number = extract_reference_number(&subject);
    rec.category = classify_category(&subject).as_str().to_string();
    rec.published_date = dates.normalize(&summary.published_date);
    rec.contract_value = normalize_amount(Some(&price));
    rec.status = canonical_status(&clean_html(&summary.status)).as_str().to_string();
    rec.procurement_entity = na();
    rec.method = na();
    rec.successful_bidder = provider.clone();
    rec.removal_date = na();
    rec.published_by = na();
    rec.published_on = na();
    rec.signed_by = na();

    let mut bidders = Vec::new();
    if !provider.is_empty() {
        bidders.push(BidderEntry {
            bidder_type: BidderType::Successful,
            name: provider.clone(),
            price: price.clone(),
            rank: "1".to_string(),
            evaluation_stage: na(),
            failure_reasons: na(),
        });
    }
    bidders.extend(named_in_text(&subject, &provider));

    rec.subject = subject;
    rec.provider = provider;
    rec.contract_price = price;
    rec.bidders = bidders;
    rec
}

// Only text that talks about "bidders" is mined; the first name found is taken
// to be the winner already listed as provider.
fn named_in_text(subject: &str, provider: &str) -> Vec<BidderEntry> {
    if !subject.to_lowercase().contains("bidders") && !provider.to_lowercase().contains("bidders") {
        return Vec::new();
    }
    extract_company_names(&format!("{subject} {provider}"))
        .into_iter()
        .enumerate()
        .skip(1)
        .map(|(i, name)| BidderEntry {
            bidder_type: BidderType::Unsuccessful,
            name,
            price: na(),
            rank: (i + 1).to_string(),
            evaluation_stage: na(),
            failure_reasons: na(),
        })
        .collect()
}

/// Placeholder record when there is neither a detail page nor a listing row.
pub fn minimal(contract_url: &str, extraction_timestamp: String) -> DetailRecord {
    let mut rec = DetailRecord::empty(contract_url, extraction_timestamp, DataSource::MinimalFallback);
    for field in [
        &mut rec.subject,
        &mut rec.reference_number,
        &mut rec.provider,
        &mut rec.published_date,
        &mut rec.contract_price,
        &mut rec.status,
        &mut rec.category,
        &mut rec.procurement_entity,
        &mut rec.method,
        &mut rec.successful_bidder,
        &mut rec.removal_date,
        &mut rec.closing_date,
        &mut rec.evaluation_date,
        &mut rec.award_date,
        &mut rec.contact_person,
        &mut rec.contact_position,
        &mut rec.published_by,
        &mut rec.published_on,
        &mut rec.signed_by,
    ] {
        *field = na();
    }
    rec.bidders = vec![BidderEntry::placeholder()];
    rec
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SummaryRecord {
        SummaryRecord {
            subject: "UNBS/SUPLS/2024-2025/00119 Supply of Office Equipment".into(),
            provider: "ACME LTD".into(),
            published_date: "2025-08-21".into(),
            contract_price: "UGX 5,000,000".into(),
            status: "Awarded".into(),
            detail_url: None,
        }
    }

    #[test]
    fn summary_fallback_keeps_listing_facts() {
        let rec = from_summary("https://egp.example/r/1", &summary(), &DateNormalizer::default(), "t".into());
        assert_eq!(rec.data_source, DataSource::MainListFallback);
        assert!(rec.detail_extraction_failed);
        assert_eq!(rec.reference_number, "UNBS/SUPLS/2024-2025/00119");
        assert_eq!(rec.successful_bidder, "ACME LTD");
        assert_eq!(rec.contract_value, 5_000_000.0);
        assert_eq!(rec.procurement_entity, NOT_AVAILABLE);
        assert_eq!(rec.bidders.len(), 1);
        assert_eq!(rec.bidders[0].bidder_type, BidderType::Successful);
        assert_eq!(rec.bidders[0].price, "UGX 5,000,000");
        assert_eq!(rec.bidders[0].evaluation_stage, NOT_AVAILABLE);
    }

    #[test]
    fn html_in_listing_cells_is_cleaned() {
        let s = SummaryRecord {
            subject: "<span>Works &amp; repairs</span>".into(),
            provider: "<a href='#'>ROAD MASTERS LTD</a>".into(),
            contract_price: "UGX\n 1,000 ".into(),
            ..SummaryRecord::default()
        };
        let rec = from_summary("u", &s, &DateNormalizer::default(), "t".into());
        assert_eq!(rec.subject, "Works & repairs");
        assert_eq!(rec.provider, "ROAD MASTERS LTD");
        assert_eq!(rec.contract_price, "UGX 1,000");
        assert_eq!(rec.reference_number, NOT_AVAILABLE);
    }

    #[test]
    fn extra_bidders_only_when_text_mentions_bidders() {
        let s = SummaryRecord {
            subject: "Supply of desks, bidders: ALPHA BUILDERS LTD, OMEGA SERVICES".into(),
            provider: "Alpha Builders Ltd".into(),
            ..SummaryRecord::default()
        };
        let rec = from_summary("u", &s, &DateNormalizer::default(), "t".into());
        assert_eq!(rec.bidders[0].name, "Alpha Builders Ltd");
        let extra: Vec<&str> = rec.bidders[1..].iter().map(|b| b.name.as_str()).collect();
        assert_eq!(extra, vec!["OMEGA SERVICES"]);
        assert_eq!(rec.bidders[1].bidder_type, BidderType::Unsuccessful);
        assert_eq!(rec.bidders[1].rank, "2");

        let quiet = from_summary("u", &summary(), &DateNormalizer::default(), "t".into());
        assert_eq!(quiet.bidders.len(), 1);
    }

    #[test]
    fn empty_provider_means_no_successful_entry() {
        let s = SummaryRecord { subject: "Fuel".into(), ..SummaryRecord::default() };
        let rec = from_summary("u", &s, &DateNormalizer::default(), "t".into());
        assert!(rec.bidders.is_empty());
    }

    #[test]
    fn minimal_record_is_all_placeholders() {
        let rec = minimal("https://egp.example/r/9", "t".into());
        assert_eq!(rec.data_source, DataSource::MinimalFallback);
        assert!(rec.detail_extraction_failed);
        assert_eq!(rec.subject, NOT_AVAILABLE);
        assert_eq!(rec.signed_by, NOT_AVAILABLE);
        assert_eq!(rec.contract_url, "https://egp.example/r/9");
        assert_eq!(rec.bidders, vec![BidderEntry::placeholder()]);
    }
}
