use serde::Serialize;

use crate::extract::{SecurityTerms, NOT_AVAILABLE};

/// Where a detail record's fields came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    DetailPage,
    MainListFallback,
    MinimalFallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::DetailPage => "detail_page",
            DataSource::MainListFallback => "main_list_fallback",
            DataSource::MinimalFallback => "minimal_fallback",
        }
    }

    pub fn is_fallback(&self) -> bool { !matches!(self, DataSource::DetailPage) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BidderType { Successful, Unsuccessful, Unknown }

impl BidderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidderType::Successful => "successful",
            BidderType::Unsuccessful => "unsuccessful",
            BidderType::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BidderEntry {
    pub bidder_type: BidderType,
    pub name: String,
    pub price: String,
    pub rank: String,
    pub evaluation_stage: String,
    pub failure_reasons: String,
}

impl BidderEntry {
    /// Stand-in when a record has no bidder information at all.
    pub fn placeholder() -> Self {
        Self {
            bidder_type: BidderType::Unknown,
            name: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            rank: NOT_AVAILABLE.to_string(),
            evaluation_stage: NOT_AVAILABLE.to_string(),
            failure_reasons: NOT_AVAILABLE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailRecord {
    pub contract_url: String,
    pub subject: String,
    pub provider: String,
    pub published_date: String,
    pub contract_price: String,
    pub contract_value: f64,
    pub status: String,
    pub category: String,
    pub procurement_entity: String,
    pub reference_number: String,
    pub method: String,
    pub successful_bidder: String,
    pub removal_date: String,
    pub closing_date: String,
    pub evaluation_date: String,
    pub award_date: String,
    pub bid_fee: f64,
    pub bid_security: SecurityTerms,
    pub contact_person: String,
    pub contact_position: String,
    pub attachments: Vec<Attachment>,
    pub published_by: String,
    pub published_on: String,
    pub signed_by: String,
    pub extraction_timestamp: String,
    pub data_source: DataSource,
    pub detail_extraction_failed: bool,
    pub bidders: Vec<BidderEntry>,
}

impl DetailRecord {
    /// Every text field empty; callers fill in what they find.
    pub fn empty(contract_url: &str, extraction_timestamp: String, data_source: DataSource) -> Self {
        Self {
            contract_url: contract_url.to_string(),
            subject: String::new(),
            provider: String::new(),
            published_date: String::new(),
            contract_price: String::new(),
            contract_value: 0.0,
            status: String::new(),
            category: String::new(),
            procurement_entity: String::new(),
            reference_number: String::new(),
            method: String::new(),
            successful_bidder: String::new(),
            removal_date: String::new(),
            closing_date: String::new(),
            evaluation_date: String::new(),
            award_date: String::new(),
            bid_fee: 0.0,
            bid_security: SecurityTerms::none(),
            contact_person: String::new(),
            contact_position: String::new(),
            attachments: Vec::new(),
            published_by: String::new(),
            published_on: String::new(),
            signed_by: String::new(),
            extraction_timestamp,
            data_source,
            detail_extraction_failed: data_source.is_fallback(),
            bidders: Vec::new(),
        }
    }
}
