//! Request classification.
//!
//! Each request is classified exactly once, from the URL alone, into
//! critical (network-first) or static (store-first). Classification is a
//! pure substring test against the request path; the query string does
//! not participate.

use url::Url;

/// Routing class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Freshness matters: try the network first, fall back to the store.
    Critical,
    /// Safe to serve from the store for the lifetime of a generation.
    Static,
}

/// Path-substring classifier built from the configured critical set.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    critical_paths: Vec<String>,
}

impl RoutePolicy {
    pub fn new(critical_paths: Vec<String>) -> Self {
        Self { critical_paths }
    }

    /// Classify a canonical URL.
    pub fn classify(&self, url: &Url) -> RequestClass {
        let path = url.path();
        if self.critical_paths.iter().any(|needle| path.contains(needle.as_str())) {
            RequestClass::Critical
        } else {
            RequestClass::Static
        }
    }
}
