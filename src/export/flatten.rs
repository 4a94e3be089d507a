use crate::detail::types::{Attachment, BidderEntry, DetailRecord};

/// Header row, in write order.
pub const COLUMNS: [&str; 34] = [
    "subject",
    "provider",
    "published_date",
    "contract_price",
    "contract_value",
    "status",
    "category",
    "contract_url",
    "procurement_entity",
    "reference_number",
    "method",
    "successful_bidder",
    "removal_date",
    "closing_date",
    "evaluation_date",
    "award_date",
    "bid_fee",
    "bid_security_amount",
    "bid_security_type",
    "contact_person",
    "contact_position",
    "attachments",
    "published_by",
    "published_on",
    "signed_by",
    "extraction_timestamp",
    "data_source",
    "detail_extraction_failed",
    "bidder_type",
    "bidder_name",
    "bidder_price",
    "bidder_rank",
    "evaluation_stage",
    "failure_reasons",
];

pub const BIDDER_COLUMNS: usize = 6;

pub fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|c| *c == name)
}

fn amount(v: f64) -> String {
    if v == 0.0 { "0".to_string() } else { v.to_string() }
}

fn attachments(list: &[Attachment]) -> String {
    list.iter().map(|a| format!("{} <{}>", a.filename, a.url)).collect::<Vec<_>>().join("; ")
}

fn scalars(rec: &DetailRecord) -> Vec<String> {
    vec![
        rec.subject.clone(),
        rec.provider.clone(),
        rec.published_date.clone(),
        rec.contract_price.clone(),
        amount(rec.contract_value),
        rec.status.clone(),
        rec.category.clone(),
        rec.contract_url.clone(),
        rec.procurement_entity.clone(),
        rec.reference_number.clone(),
        rec.method.clone(),
        rec.successful_bidder.clone(),
        rec.removal_date.clone(),
        rec.closing_date.clone(),
        rec.evaluation_date.clone(),
        rec.award_date.clone(),
        amount(rec.bid_fee),
        amount(rec.bid_security.amount),
        rec.bid_security.instrument.clone().unwrap_or_default(),
        rec.contact_person.clone(),
        rec.contact_position.clone(),
        attachments(&rec.attachments),
        rec.published_by.clone(),
        rec.published_on.clone(),
        rec.signed_by.clone(),
        rec.extraction_timestamp.clone(),
        rec.data_source.as_str().to_string(),
        rec.detail_extraction_failed.to_string(),
    ]
}

fn bidder(b: &BidderEntry) -> [String; BIDDER_COLUMNS] {
    [
        b.bidder_type.as_str().to_string(),
        b.name.clone(),
        b.price.clone(),
        b.rank.clone(),
        b.evaluation_stage.clone(),
        b.failure_reasons.clone(),
    ]
}

/// One row per bidder of this record only; a record without bidders still
/// yields a single row carrying the placeholder bidder.
pub fn flatten(rec: &DetailRecord) -> Vec<Vec<String>> {
    let base = scalars(rec);
    let placeholder;
    let bidders: &[BidderEntry] = if rec.bidders.is_empty() {
        placeholder = [BidderEntry::placeholder()];
        &placeholder
    } else {
        &rec.bidders
    };
    bidders
        .iter()
        .map(|b| {
            let mut row = base.clone();
            row.extend(bidder(b));
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::types::{BidderType, DataSource};
    use crate::extract::SecurityTerms;

    const SCALAR_COLUMNS: usize = COLUMNS.len() - BIDDER_COLUMNS;

    fn record(bidders: usize) -> DetailRecord {
        let mut rec = DetailRecord::empty("https://egp.example/r/1", "2025-08-21T10:00:00+03:00".into(), DataSource::DetailPage);
        rec.subject = "Supply of Office Equipment".into();
        rec.contract_value = 5_000_000.0;
        rec.bid_security = SecurityTerms::from_amount(100_000.0);
        rec.attachments = vec![Attachment { filename: "Notice".into(), url: "https://egp.example/n.pdf".into() }];
        rec.bidders = (0..bidders)
            .map(|i| BidderEntry {
                bidder_type: if i == 0 { BidderType::Successful } else { BidderType::Unsuccessful },
                name: format!("BIDDER {i}"),
                price: "UGX 1".into(),
                rank: (i + 1).to_string(),
                evaluation_stage: "N/A".into(),
                failure_reasons: "N/A".into(),
            })
            .collect();
        rec
    }

    #[test]
    fn header_and_rows_line_up() {
        for row in flatten(&record(2)) {
            assert_eq!(row.len(), COLUMNS.len());
        }
        assert_eq!(SCALAR_COLUMNS, 28);
    }

    #[test]
    fn row_count_is_max_of_bidders_and_one() {
        for k in [0usize, 1, 3] {
            let rows = flatten(&record(k));
            assert_eq!(rows.len(), k.max(1));
            let first = &rows[0][..SCALAR_COLUMNS];
            assert!(rows.iter().all(|r| &r[..SCALAR_COLUMNS] == first));
        }
    }

    #[test]
    fn empty_bidder_list_gets_placeholder_row() {
        let rows = flatten(&record(0));
        let i = column_index("bidder_type").unwrap();
        assert_eq!(rows[0][i], "unknown");
        assert_eq!(rows[0][i + 1], "N/A");
    }

    #[test]
    fn scalar_rendering() {
        let row = &flatten(&record(1))[0];
        let col = |n: &str| row[column_index(n).unwrap()].as_str();
        assert_eq!(col("contract_value"), "5000000");
        assert_eq!(col("bid_fee"), "0");
        assert_eq!(col("bid_security_amount"), "100000");
        assert!(!col("bid_security_type").is_empty());
        assert_eq!(col("attachments"), "Notice <https://egp.example/n.pdf>");
        assert_eq!(col("data_source"), "detail_page");
        assert_eq!(col("detail_extraction_failed"), "false");
        assert_eq!(col("bidder_name"), "BIDDER 0");
    }
}
