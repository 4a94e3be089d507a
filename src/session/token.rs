use scraper::{Html, Selector};

use super::AuthError;

/// Value of the hidden anti-forgery input named `field`.
pub fn extract_csrf_token(html: &str, field: &str) -> Result<String, AuthError> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse(&format!("input[name=\"{field}\"]")).map_err(|_| AuthError::TokenNotFound)?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr("value"))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(AuthError::TokenNotFound)
}
