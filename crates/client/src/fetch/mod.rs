//! HTTP fetch pipeline for the offline resource proxy.
//!
//! ### URL Canonicalization
//! - Trim whitespace, resolve relative identifiers against the upstream
//!   origin
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Buffering
//! Response bodies are read to completion into `Bytes` before the
//! response is handed back, so the same response can be persisted to the
//! store and replayed to a consumer without re-reading a stream.
//!
//! ### Status handling
//! A completed HTTP exchange is `Ok` regardless of status code; the
//! routing policy decides what a non-success status means. Only
//! transport-level failures (offline, DNS, timeout, body read) and
//! oversized bodies are errors.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, Method, StatusCode, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize};

use outpost_core::Error;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "outpost/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "outpost/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// How a completed response relates to the upstream origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Same-origin, served from the requested URL directly.
    Basic,
    /// Served from a different origin than the application's.
    CrossOrigin,
    /// Arrived via one or more redirects.
    Redirected,
}

/// A completed response with a fully buffered body.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchedResponse {
    /// Classify this response relative to the application origin.
    pub fn kind(&self, app_origin: &Url) -> ResponseKind {
        if self.final_url != self.url {
            return ResponseKind::Redirected;
        }
        if self.final_url.origin() != app_origin.origin() {
            return ResponseKind::CrossOrigin;
        }
        ResponseKind::Basic
    }
}

/// Seam between the routing policy and the network.
///
/// The proxy holds a `dyn Fetch` so tests can swap in a programmable
/// stub and simulate offline conditions.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform a request, buffering the body.
    ///
    /// `url` must already be canonical.
    async fn fetch(&self, method: &str, url: &Url) -> Result<FetchedResponse, Error>;
}

/// reqwest-backed fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for FetchClient {
    async fn fetch(&self, method: &str, url: &Url) -> Result<FetchedResponse, Error> {
        let start = Instant::now();

        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("bad method: {method:?}")))?;

        let response = self
            .http
            .request(method, url.clone())
            .send()
            .await
            .map_err(|e| Error::FetchFailed(format!("network error: {e}")))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::FetchFailed(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes, {})",
            url,
            final_url,
            fetch_ms,
            bytes.len(),
            status
        );

        Ok(FetchedResponse { url: url.clone(), final_url, status, content_type, bytes, headers, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(url: &str, final_url: &str) -> FetchedResponse {
        FetchedResponse {
            url: Url::parse(url).unwrap(),
            final_url: Url::parse(final_url).unwrap(),
            status: StatusCode::OK,
            content_type: Some("text/css".to_string()),
            bytes: Bytes::from_static(b"body{}"),
            headers: header::HeaderMap::new(),
            fetch_ms: 3,
        }
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "outpost/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_kind_basic() {
        let origin = Url::parse("http://127.0.0.1:5173").unwrap();
        let resp = response("http://127.0.0.1:5173/App.css", "http://127.0.0.1:5173/App.css");
        assert_eq!(resp.kind(&origin), ResponseKind::Basic);
    }

    #[test]
    fn test_kind_cross_origin() {
        let origin = Url::parse("http://127.0.0.1:5173").unwrap();
        let resp = response(
            "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css",
            "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css",
        );
        assert_eq!(resp.kind(&origin), ResponseKind::CrossOrigin);
    }

    #[test]
    fn test_kind_redirected() {
        let origin = Url::parse("http://127.0.0.1:5173").unwrap();
        let resp = response("http://127.0.0.1:5173/old.css", "http://127.0.0.1:5173/new.css");
        assert_eq!(resp.kind(&origin), ResponseKind::Redirected);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let config = FetchConfig::default();
        let client = FetchClient::new(config).unwrap();
        assert_eq!(client.config().max_redirects, 5);
    }
}
