use scraper::{Html, Selector};
use serde_json::Value;

use super::types::SummaryRecord;
use super::ListingError;

pub const AJAX_PATH: &str = "/best-evaluated-bidder-notice-reports/api-current-beds/ajax";
pub const DETAIL_PATH: &str = "/best-evaluated-bidder-notice-report";

// Column order the DataTables endpoint expects; the last one is not sortable.
const COLUMNS: [&str; 6] = ["procurement_subject", "provider", "published_date", "contract_price", "status_state", "action_links"];

#[derive(Clone, Debug)]
pub struct PageRequest {
    pub draw: u32,
    pub start: u32,
    pub length: u32,
    pub sort_column: u32,
    pub sort_dir: String,
}

/// Form body for one DataTables page.
pub fn build_form(req: &PageRequest, token: Option<&str>) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("draw".into(), req.draw.to_string()),
        ("start".into(), req.start.to_string()),
        ("length".into(), req.length.to_string()),
        ("search[value]".into(), String::new()),
        ("search[regex]".into(), "false".into()),
        ("order[0][column]".into(), req.sort_column.to_string()),
        ("order[0][dir]".into(), req.sort_dir.clone()),
    ];
    for (i, name) in COLUMNS.iter().enumerate() {
        let sortable = (i + 1 < COLUMNS.len()).to_string();
        form.push((format!("columns[{i}][data]"), name.to_string()));
        form.push((format!("columns[{i}][name]"), String::new()));
        form.push((format!("columns[{i}][searchable]"), sortable.clone()));
        form.push((format!("columns[{i}][orderable]"), sortable));
    }
    if let Some(tok) = token {
        form.push(("_token".into(), tok.to_string()));
    }
    form
}

fn text_field(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn first_anchor(fragment: &str) -> Option<String> {
    let frag = Html::parse_fragment(fragment);
    let a = Selector::parse("a[href]").ok()?;
    let href = frag.select(&a).next()?.value().attr("href")?.trim().to_string();
    if href.is_empty() { None } else { Some(href) }
}

/// Detail link for a row: built from `id`, else the first anchor in `action_links`.
/// Relative links are resolved by `resolve`.
fn detail_link(row: &Value, resolve: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    if let Some(id) = text_field(row, "id").filter(|s| !s.trim().is_empty()) {
        return resolve(&format!("{DETAIL_PATH}/{}", id.trim()));
    }
    let links = text_field(row, "action_links")?;
    resolve(&first_anchor(&links)?)
}

/// Rows from one JSON page. A body without a `data` array is an empty page.
pub fn parse_rows(body: &str, resolve: &dyn Fn(&str) -> Option<String>) -> Result<Vec<SummaryRecord>, ListingError> {
    let json: Value = serde_json::from_str(body).map_err(|e| ListingError::Decode(e.to_string()))?;
    let Some(rows) = json.get("data").and_then(Value::as_array) else { return Ok(Vec::new()) };
    Ok(rows
        .iter()
        .map(|row| SummaryRecord {
            subject: text_field(row, "procurement_subject").unwrap_or_default(),
            provider: text_field(row, "provider").unwrap_or_default(),
            published_date: text_field(row, "published_date").unwrap_or_default(),
            contract_price: text_field(row, "contract_price").unwrap_or_default(),
            status: text_field(row, "status").or_else(|| text_field(row, "status_state")).unwrap_or_default(),
            detail_url: detail_link(row, resolve),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(href: &str) -> Option<String> {
        Some(if href.starts_with("http") { href.to_string() } else { format!("https://egp.example{href}") })
    }

    #[test]
    fn form_carries_paging_sort_and_token() {
        let req = PageRequest { draw: 2, start: 100, length: 100, sort_column: 2, sort_dir: "desc".into() };
        let form = build_form(&req, Some("tok"));
        let get = |k: &str| form.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("draw"), Some("2"));
        assert_eq!(get("start"), Some("100"));
        assert_eq!(get("order[0][column]"), Some("2"));
        assert_eq!(get("order[0][dir]"), Some("desc"));
        assert_eq!(get("columns[0][data]"), Some("procurement_subject"));
        assert_eq!(get("columns[5][orderable]"), Some("false"));
        assert_eq!(get("_token"), Some("tok"));
        assert!(build_form(&req, None).iter().all(|(k, _)| k != "_token"));
    }

    #[test]
    fn rows_take_id_or_action_link() {
        let body = r#"{"draw":1,"recordsTotal":2,"data":[
            {"id":119,"procurement_subject":"<b>Supply</b>","provider":"ACME LTD","published_date":"2025-08-21","contract_price":"UGX 5,000,000","status":"Awarded"},
            {"procurement_subject":"Works","provider":"B","status_state":"Cancelled","action_links":"<a class='btn' href='/best-evaluated-bidder-notice-report/7'>View</a>"}
        ]}"#;
        let rows = parse_rows(body, &resolve).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].detail_url.as_deref(), Some("https://egp.example/best-evaluated-bidder-notice-report/119"));
        assert_eq!(rows[0].subject, "<b>Supply</b>");
        assert_eq!(rows[1].status, "Cancelled");
        assert_eq!(rows[1].detail_url.as_deref(), Some("https://egp.example/best-evaluated-bidder-notice-report/7"));
        assert_eq!(rows[1].published_date, "");
    }

    #[test]
    fn missing_envelope_is_no_data() {
        assert!(parse_rows(r#"{"message":"ok"}"#, &resolve).unwrap().is_empty());
        assert!(parse_rows(r#"{"data":[]}"#, &resolve).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(parse_rows("<html>", &resolve), Err(ListingError::Decode(_))));
    }
}
