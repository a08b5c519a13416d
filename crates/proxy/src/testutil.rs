//! Test doubles shared across the proxy's test modules.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;
use outpost_client::{Fetch, FetchedResponse};
use outpost_core::{AppConfig, Error, ResponseStore};
use url::Url;

use crate::state::ProxyState;

#[derive(Clone)]
enum StubOutcome {
    Response { status: u16, body: Vec<u8>, final_url: Option<String> },
}

/// Programmable `Fetch` implementation.
///
/// URLs without a registered outcome behave as offline (transport
/// failure), so "network down" is the default state of the world.
pub struct StubFetch {
    outcomes: Mutex<HashMap<String, StubOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { outcomes: Mutex::new(HashMap::new()), calls: Mutex::new(Vec::new()) })
    }

    /// Register a direct response for a URL.
    pub fn respond(&self, url: &str, status: u16, body: &[u8]) {
        self.outcomes.lock().unwrap().insert(
            url.to_string(),
            StubOutcome::Response { status, body: body.to_vec(), final_url: None },
        );
    }

    /// Register a response that arrives via a redirect.
    pub fn respond_redirected(&self, url: &str, status: u16, body: &[u8], final_url: &str) {
        self.outcomes.lock().unwrap().insert(
            url.to_string(),
            StubOutcome::Response { status, body: body.to_vec(), final_url: Some(final_url.to_string()) },
        );
    }

    /// Every fetch performed so far, as "METHOD url" strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for StubFetch {
    async fn fetch(&self, method: &str, url: &Url) -> Result<FetchedResponse, Error> {
        self.calls.lock().unwrap().push(format!("{method} {url}"));

        let outcome = self.outcomes.lock().unwrap().get(url.as_str()).cloned();
        match outcome {
            Some(StubOutcome::Response { status, body, final_url }) => {
                let mut headers = HeaderMap::new();
                headers.insert("content-type", HeaderValue::from_static("text/plain"));
                Ok(FetchedResponse {
                    url: url.clone(),
                    final_url: final_url.map(|u| Url::parse(&u).unwrap()).unwrap_or_else(|| url.clone()),
                    status: StatusCode::from_u16(status).unwrap(),
                    content_type: Some("text/plain".to_string()),
                    bytes: Bytes::from(body),
                    headers,
                    fetch_ms: 1,
                })
            }
            None => Err(Error::FetchFailed("network unreachable".to_string())),
        }
    }
}

/// Proxy state with default configuration and no active generation.
pub fn bare_state(stub: Arc<StubFetch>) -> Arc<ProxyState> {
    Arc::new(ProxyState::new(AppConfig::default(), stub).unwrap())
}

/// Proxy state with default configuration and an in-memory generation
/// already taken over.
pub async fn stub_state(stub: Arc<StubFetch>) -> Arc<ProxyState> {
    let state = bare_state(stub);
    let store = ResponseStore::open_in_memory(&state.config.generation).await.unwrap();
    state.take_over(Arc::new(store)).await;
    state
}
