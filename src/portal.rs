use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::detail::DetailSource;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Request(err.to_string()) }
    }
}

/// Status, final URL (after redirects) and body of one response.
#[derive(Clone, Debug)]
pub struct PageResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// One cookie-carrying HTTP session against the portal.
#[derive(Clone, Debug)]
pub struct PortalClient {
    http: Client,
    base_url: Url,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|_| FetchError::InvalidUrl(base_url.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let http = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self { http, base_url })
    }

    /// Absolute URL for a path or href relative to the portal root.
    pub fn resolve(&self, href: &str) -> Result<String, FetchError> {
        self.base_url
            .join(href)
            .map(|u| u.to_string())
            .map_err(|_| FetchError::InvalidUrl(href.to_string()))
    }

    pub async fn get(&self, url: &str) -> Result<PageResponse, FetchError> {
        let resp = self.http.get(url).send().await.map_err(FetchError::from_reqwest)?;
        read_page(resp).await
    }

    pub async fn get_query(&self, url: &str, query: &[(String, String)]) -> Result<PageResponse, FetchError> {
        let resp = self.http.get(url).query(query).send().await.map_err(FetchError::from_reqwest)?;
        read_page(resp).await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        extra_headers: &[(HeaderName, String)],
    ) -> Result<PageResponse, FetchError> {
        let mut req = self.http.post(url).form(form);
        for (name, value) in extra_headers {
            req = req.header(name.clone(), value.as_str());
        }
        let resp = req.send().await.map_err(FetchError::from_reqwest)?;
        read_page(resp).await
    }
}

async fn read_page(resp: reqwest::Response) -> Result<PageResponse, FetchError> {
    let status = resp.status().as_u16();
    let url = resp.url().to_string();
    let body = resp.text().await.map_err(FetchError::from_reqwest)?;
    Ok(PageResponse { status, url, body })
}

#[async_trait]
impl DetailSource for PortalClient {
    async fn get_page(&self, url: &str, timeout: Duration) -> Result<PageResponse, FetchError> {
        let resp = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        read_page(resp).await
    }
}
