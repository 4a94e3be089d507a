use serde::Serialize;

/// One row of a listing page, before any detail enrichment.
/// Text fields are kept as the portal sent them (they may still carry HTML).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub subject: String,
    pub provider: String,
    pub published_date: String,
    pub contract_price: String,
    pub status: String,
    pub detail_url: Option<String>,
}
