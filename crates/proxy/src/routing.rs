//! Request routing.
//!
//! One routing pass per request: classify once, then run the class's
//! fetch/lookup order. Store writes happen off the response path as
//! detached tasks; the handle is surfaced so tests can await the write,
//! while the HTTP layer simply drops it.

use std::sync::Arc;

use chrono::Utc;
use outpost_client::{FetchedResponse, ResponseKind};
use outpost_core::store::identity::request_identity;
use outpost_core::{Error, ResponseStore, StoredResponse};
use tokio::task::JoinHandle;
use url::Url;

use crate::policy::RequestClass;
use crate::state::ProxyState;

/// A response produced by routing, from either source.
#[derive(Debug)]
pub enum RoutedResponse {
    Network(FetchedResponse),
    Stored(StoredResponse),
}

impl RoutedResponse {
    /// Which side produced the response.
    pub fn source(&self) -> &'static str {
        match self {
            RoutedResponse::Network(_) => "network",
            RoutedResponse::Stored(_) => "store",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            RoutedResponse::Network(resp) => resp.status.as_u16(),
            RoutedResponse::Stored(entry) => entry.status,
        }
    }

    pub fn body(&self) -> &[u8] {
        match self {
            RoutedResponse::Network(resp) => &resp.bytes,
            RoutedResponse::Stored(entry) => &entry.body,
        }
    }
}

/// Routing outcome: the response plus the detached store write, if one
/// was started for this request.
#[derive(Debug)]
pub struct Routed {
    pub response: RoutedResponse,
    pub pending_write: Option<JoinHandle<()>>,
}

impl Routed {
    fn new(response: RoutedResponse) -> Self {
        Self { response, pending_write: None }
    }
}

/// Route one request through the hybrid critical/static policy.
///
/// `target` must be canonical. The store generation is sampled once at
/// entry, so the whole pass observes a single generation.
pub async fn route(state: &ProxyState, method: &str, target: &Url) -> Result<Routed, Error> {
    let identity = request_identity(method, target.as_str());
    let store = state.store().await;

    match state.policy.classify(target) {
        RequestClass::Critical => route_critical(state, store, method, target, &identity).await,
        RequestClass::Static => route_static(state, store, method, target, &identity).await,
    }
}

/// Network first; store is the offline fallback.
async fn route_critical(
    state: &ProxyState, store: Option<Arc<ResponseStore>>, method: &str, target: &Url, identity: &str,
) -> Result<Routed, Error> {
    match state.fetcher.fetch(method, target).await {
        Ok(resp) => {
            let pending_write = if resp.status.is_success() {
                spawn_write(store, snapshot(method, target, &resp))
            } else {
                None
            };
            Ok(Routed { response: RoutedResponse::Network(resp), pending_write })
        }
        Err(err) => {
            tracing::warn!(url = %target, error = %err, "network unavailable for critical resource, trying store");
            match lookup(store.as_deref(), identity).await {
                Some(entry) => Ok(Routed::new(RoutedResponse::Stored(entry))),
                None => Err(Error::NoUsableResponse(format!("{method} {target}: {err}"))),
            }
        }
    }
}

/// Store first; a hit never touches the network.
async fn route_static(
    state: &ProxyState, store: Option<Arc<ResponseStore>>, method: &str, target: &Url, identity: &str,
) -> Result<Routed, Error> {
    if let Some(entry) = lookup(store.as_deref(), identity).await {
        tracing::debug!(url = %target, "serving from store");
        return Ok(Routed::new(RoutedResponse::Stored(entry)));
    }

    match state.fetcher.fetch(method, target).await {
        Ok(resp) => {
            let cacheable = resp.status.is_success() && resp.kind(&state.origin) == ResponseKind::Basic;
            let pending_write =
                if cacheable { spawn_write(store, snapshot(method, target, &resp)) } else { None };
            Ok(Routed { response: RoutedResponse::Network(resp), pending_write })
        }
        Err(err) => {
            tracing::error!(url = %target, error = %err, "static resource unavailable");
            Err(Error::NoUsableResponse(format!("{method} {target}: {err}")))
        }
    }
}

/// Store lookup that never propagates store errors: a failed lookup is a
/// miss, logged.
async fn lookup(store: Option<&ResponseStore>, identity: &str) -> Option<StoredResponse> {
    match store?.get(identity).await {
        Ok(hit) => hit,
        Err(err) => {
            tracing::warn!(error = %err, "store lookup failed, treating as miss");
            None
        }
    }
}

/// Start a detached best-effort store write.
fn spawn_write(store: Option<Arc<ResponseStore>>, entry: StoredResponse) -> Option<JoinHandle<()>> {
    let store = store?;
    Some(tokio::spawn(async move {
        if let Err(err) = store.put(&entry).await {
            tracing::warn!(url = %entry.url, error = %err, "background store write failed");
        }
    }))
}

/// Snapshot a buffered response for persistence.
///
/// The buffered bytes are copied here, so the snapshot and the response
/// handed to the consumer never share a read cursor.
pub(crate) fn snapshot(method: &str, url: &Url, resp: &FetchedResponse) -> StoredResponse {
    let headers = resp
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect();

    StoredResponse {
        identity: request_identity(method, url.as_str()),
        method: method.to_ascii_uppercase(),
        url: url.to_string(),
        status: resp.status.as_u16(),
        headers,
        body: resp.bytes.to_vec(),
        stored_at: Utc::now().to_rfc3339(),
    }
}
