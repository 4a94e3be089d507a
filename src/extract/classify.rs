use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category { Construction, Supplies, Services, It, Healthcare, Education, Other }

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Construction => "construction",
            Category::Supplies => "supplies",
            Category::Services => "services",
            Category::It => "it",
            Category::Healthcare => "healthcare",
            Category::Education => "education",
            Category::Other => "other",
        }
    }
}

// Iteration order is the tie-break: first category with any keyword hit wins.
const CATEGORY_KEYWORDS: [(Category, &[&str]); 6] = [
    (Category::Construction, &["construction", "building", "infrastructure", "road", "bridge", "renovation"]),
    (Category::Supplies, &["supply", "delivery", "procurement", "purchase", "equipment", "materials"]),
    (Category::Services, &["service", "maintenance", "consultancy", "training", "support"]),
    (Category::It, &["software", "hardware", "it", "technology", "system", "digital"]),
    (Category::Healthcare, &["medical", "health", "hospital", "clinic", "pharmaceutical"]),
    (Category::Education, &["education", "training", "school", "university", "learning"]),
];

pub fn classify_category(title: &str) -> Category {
    let lower = title.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, kws)| kws.iter().any(|kw| lower.contains(kw)))
        .map(|(cat, _)| *cat)
        .unwrap_or(Category::Other)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProcurementMethod {
    OpenDomesticBidding,
    RestrictedBidding,
    DirectProcurement,
    FrameworkAgreement,
    RequestForQuotations,
    RequestForProposals,
    SingleSource,
}

impl ProcurementMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcurementMethod::OpenDomesticBidding => "Open Domestic Bidding",
            ProcurementMethod::RestrictedBidding => "Restricted Bidding",
            ProcurementMethod::DirectProcurement => "Direct Procurement",
            ProcurementMethod::FrameworkAgreement => "Framework Agreement",
            ProcurementMethod::RequestForQuotations => "Request for Quotations",
            ProcurementMethod::RequestForProposals => "Request for Proposals",
            ProcurementMethod::SingleSource => "Single Source",
        }
    }
}

const LOTS_DECORATOR: &str = "has lots";

// Checked top to bottom; "open" is the catch-all and stays last.
const METHOD_NEEDLES: [(&str, ProcurementMethod); 10] = [
    ("restricted", ProcurementMethod::RestrictedBidding),
    ("direct", ProcurementMethod::DirectProcurement),
    ("framework", ProcurementMethod::FrameworkAgreement),
    ("quotation", ProcurementMethod::RequestForQuotations),
    ("rfq", ProcurementMethod::RequestForQuotations),
    ("proposal", ProcurementMethod::RequestForProposals),
    ("rfp", ProcurementMethod::RequestForProposals),
    ("single source", ProcurementMethod::SingleSource),
    ("sole source", ProcurementMethod::SingleSource),
    ("open", ProcurementMethod::OpenDomesticBidding),
];

pub fn canonical_method(raw: &str) -> ProcurementMethod {
    let lower = raw.to_lowercase().replace(LOTS_DECORATOR, "");
    let lower = lower.trim();
    if lower.is_empty() { return ProcurementMethod::OpenDomesticBidding; }
    METHOD_NEEDLES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, m)| *m)
        .unwrap_or(ProcurementMethod::OpenDomesticBidding)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ContractStatus { Open, Closed, Awarded, Cancelled }

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Open => "Open",
            ContractStatus::Closed => "Closed",
            ContractStatus::Awarded => "Awarded",
            ContractStatus::Cancelled => "Cancelled",
        }
    }
}

pub fn canonical_status(raw: &str) -> ContractStatus {
    let lower = raw.to_lowercase();
    if lower.contains("cancel") { ContractStatus::Cancelled }
    else if lower.contains("award") { ContractStatus::Awarded }
    else if lower.contains("close") || lower.contains("expired") { ContractStatus::Closed }
    else { ContractStatus::Open }
}
