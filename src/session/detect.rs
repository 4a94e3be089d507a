use crate::portal::PageResponse;

/// Decides whether a login POST left us signed in.
pub trait LoginDetector: Send + Sync {
    fn is_authenticated(&self, response: &PageResponse) -> bool;
}

/// The portal gives no structured signal, so look for post-login URL paths or page text.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    pub url_markers: Vec<String>,
    pub body_markers: Vec<String>,
}

impl Default for MarkerDetector {
    fn default() -> Self {
        Self {
            url_markers: vec!["dashboard".to_string()],
            body_markers: vec!["best-evaluated-bidders".to_string(), "logout".to_string()],
        }
    }
}

impl LoginDetector for MarkerDetector {
    fn is_authenticated(&self, response: &PageResponse) -> bool {
        let body = response.body.to_lowercase();
        self.url_markers.iter().any(|m| response.url.contains(m.as_str()))
            || self.body_markers.iter().any(|m| body.contains(&m.to_lowercase()))
    }
}
