//! Pure field normalizers. Nothing here does I/O and nothing here fails:
//! unparseable input comes back as a documented default.

pub mod amount;
pub mod classify;
pub mod date;
pub mod text;

pub use amount::{normalize_amount, security_terms, SecurityTerms};
pub use classify::{canonical_method, canonical_status, classify_category};
pub use date::{DateNormalizer, ParseFailurePolicy};
pub use text::{clean_html, clean_price, collapse_whitespace, NOT_AVAILABLE};
