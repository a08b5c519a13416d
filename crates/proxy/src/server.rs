//! HTTP interception surface.
//!
//! A small axum router: `/health` for liveness, and a catch-all fallback
//! that resolves the request against the upstream origin, routes it, and
//! replays the result. Dropping the routing outcome's write handle here
//! is what detaches the background store write.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use outpost_client::canonicalize;

use crate::routing::{self, RoutedResponse};
use crate::state::ProxyState;

/// Marker header recording which side produced the response.
pub const SOURCE_HEADER: &str = "x-outpost-source";

/// Hop-by-hop headers that must not be replayed to the consumer.
const HOP_BY_HOP: &[&str] = &["connection", "keep-alive", "transfer-encoding", "content-length"];

/// Create the proxy router.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(proxy)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    generation: String,
}

async fn health(State(state): State<Arc<ProxyState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generation: state.config.generation.clone(),
    })
}

async fn proxy(State(state): State<Arc<ProxyState>>, req: Request) -> Response {
    let method = req.method().as_str().to_string();
    let target_input = req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let target = match canonicalize(target_input, &state.origin) {
        Ok(url) => url,
        Err(err) => {
            tracing::debug!(target = %target_input, error = %err, "unroutable request target");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match routing::route(&state, &method, &target).await {
        Ok(routed) => {
            tracing::debug!(
                url = %target,
                source = routed.response.source(),
                bytes = routed.response.body().len(),
                "routed"
            );
            replay(routed.response)
        }
        Err(err) => {
            tracing::debug!(url = %target, error = %err, "request yielded no usable response");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Rebuild an HTTP response from a routing outcome.
fn replay(response: RoutedResponse) -> Response {
    let source = response.source();

    let mut builder = Response::builder().status(
        StatusCode::from_u16(response.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    );

    match &response {
        RoutedResponse::Network(resp) => {
            for (name, value) in resp.headers.iter() {
                if !is_hop_by_hop(name.as_str()) {
                    builder = builder.header(name, value);
                }
            }
        }
        RoutedResponse::Stored(entry) => {
            for (name, value) in &entry.headers {
                if is_hop_by_hop(name) {
                    continue;
                }
                if let (Ok(name), Ok(value)) =
                    (name.parse::<HeaderName>(), HeaderValue::from_str(value))
                {
                    builder = builder.header(name, value);
                }
            }
        }
    }

    let body = match response {
        RoutedResponse::Network(resp) => Body::from(resp.bytes),
        RoutedResponse::Stored(entry) => Body::from(entry.body),
    };

    builder
        .header(SOURCE_HEADER, source)
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}
