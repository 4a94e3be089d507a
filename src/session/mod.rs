use thiserror::Error;

use crate::portal::{FetchError, PortalClient};
use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;

pub mod detect;
pub mod token;

pub use detect::{LoginDetector, MarkerDetector};
pub use token::extract_csrf_token;

pub const TOKEN_FIELD: &str = "_token";
const LOGIN_PATH: &str = "/login";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("anti-forgery token not found")]
    TokenNotFound,
    #[error("login request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("login was not accepted (ended at {url})")]
    Rejected { url: String },
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("username", &self.username).field("password", &"***").finish()
    }
}

/// Signed-in portal session: the cookie jar lives in the client.
#[derive(Clone, Debug)]
pub struct AuthenticatedContext {
    pub client: PortalClient,
    pub csrf_token: Option<String>,
}

impl AuthenticatedContext {
    /// Re-read the per-page token from `path`; keeps the old one when the page has none.
    pub async fn refresh_token(&mut self, path: &str) -> Result<Option<String>, FetchError> {
        let url = self.client.resolve(path)?;
        let page = self.client.get(&url).await?;
        if let Ok(tok) = extract_csrf_token(&page.body, TOKEN_FIELD) {
            self.csrf_token = Some(tok);
        }
        Ok(self.csrf_token.clone())
    }
}

pub async fn authenticate(
    client: PortalClient,
    creds: &Credentials,
    detector: &dyn LoginDetector,
) -> Result<AuthenticatedContext, AuthError> {
    let log = telemetry::scrape();
    let _s = log.span_kv(&ScrapePhase::Login, [("user", creds.username.clone())]).entered();

    let login_url = client.resolve(LOGIN_PATH)?;
    let form_page = client.get(&login_url).await?;
    let csrf_token = match extract_csrf_token(&form_page.body, TOKEN_FIELD) {
        Ok(t) => Some(t),
        Err(e) => {
            log.warn(format!("⚠️ {} on {}; submitting without it", e, login_url));
            None
        }
    };

    let mut form = vec![
        ("email".to_string(), creds.username.clone()),
        ("password".to_string(), creds.password.clone()),
    ];
    if let Some(tok) = &csrf_token {
        form.push((TOKEN_FIELD.to_string(), tok.clone()));
    }

    let resp = client.post_form(&login_url, &form, &[]).await?;
    if !detector.is_authenticated(&resp) {
        log.error(format!("❌ login rejected (status={} url={})", resp.status, resp.url));
        return Err(AuthError::Rejected { url: resp.url });
    }

    log.info_kv("🔐 logged in", [("url", resp.url.clone())]);
    // The post-login page may carry a fresh token; prefer it.
    let csrf_token = extract_csrf_token(&resp.body, TOKEN_FIELD).ok().or(csrf_token);
    Ok(AuthenticatedContext { client, csrf_token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials { username: "buyer@example.com".into(), password: "s3cret".into() }
    }

    async fn login_form(server: &MockServer, token: Option<&str>) {
        let input = token.map(|t| format!(r#"<input type="hidden" name="_token" value="{t}">"#)).unwrap_or_default();
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("<form>{input}</form>")))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn posts_token_and_follows_to_dashboard() {
        let server = MockServer::start().await;
        login_form(&server, Some("tok-1")).await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("_token=tok-1"))
            .and(body_string_contains("email=buyer%40example.com"))
            .respond_with(ResponseTemplate::new(303).insert_header("Location", "/dashboard"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
            .mount(&server)
            .await;

        let client = PortalClient::new(&server.uri()).unwrap();
        let ctx = authenticate(client, &creds(), &MarkerDetector::default()).await.unwrap();
        assert_eq!(ctx.csrf_token.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn missing_token_still_attempts_login() {
        let server = MockServer::start().await;
        login_form(&server, None).await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/logout">Logout</a>"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = PortalClient::new(&server.uri()).unwrap();
        let ctx = authenticate(client, &creds(), &MarkerDetector::default()).await.unwrap();
        assert!(ctx.csrf_token.is_none());
    }

    #[tokio::test]
    async fn no_marker_means_rejected() {
        let server = MockServer::start().await;
        login_form(&server, Some("tok-1")).await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("These credentials do not match our records."))
            .mount(&server)
            .await;

        let client = PortalClient::new(&server.uri()).unwrap();
        let err = authenticate(client, &creds(), &MarkerDetector::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { .. }));
    }

    #[tokio::test]
    async fn refresh_replaces_token_only_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/best-evaluated-bidders"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<input name="_token" value="tok-2">"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>no form</p>"))
            .mount(&server)
            .await;

        let client = PortalClient::new(&server.uri()).unwrap();
        let mut ctx = AuthenticatedContext { client, csrf_token: Some("tok-1".into()) };
        assert_eq!(ctx.refresh_token("/best-evaluated-bidders").await.unwrap().as_deref(), Some("tok-2"));
        assert_eq!(ctx.refresh_token("/plain").await.unwrap().as_deref(), Some("tok-2"));
    }
}
