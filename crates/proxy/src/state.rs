//! Shared proxy state.
//!
//! Holds the configuration, the network seam, the classification policy,
//! and the handle to the current store generation. The generation handle
//! is swappable at any moment; taking over does not wait for in-flight
//! requests, which keep the handle they already cloned.

use std::sync::Arc;

use outpost_client::Fetch;
use outpost_core::{AppConfig, Error, ResponseStore};
use tokio::sync::RwLock;
use url::Url;

use crate::policy::RoutePolicy;

/// State shared across all request handlers and lifecycle hooks.
pub struct ProxyState {
    pub config: AppConfig,
    /// Parsed upstream origin every routed request resolves against.
    pub origin: Url,
    pub policy: RoutePolicy,
    pub fetcher: Arc<dyn Fetch>,
    current: RwLock<Option<Arc<ResponseStore>>>,
}

impl ProxyState {
    /// Build proxy state from validated configuration.
    ///
    /// No generation is current until `take_over` runs; routing treats
    /// that window as an always-miss store.
    pub fn new(config: AppConfig, fetcher: Arc<dyn Fetch>) -> Result<Self, Error> {
        let origin =
            Url::parse(&config.upstream_origin).map_err(|e| Error::InvalidUrl(format!("upstream_origin: {e}")))?;
        let policy = RoutePolicy::new(config.critical_paths.clone());
        Ok(Self { config, origin, policy, fetcher, current: RwLock::new(None) })
    }

    /// Handle to the current store generation, if one has taken over.
    ///
    /// Callers clone the handle once per request so a single request
    /// never observes two generations.
    pub async fn store(&self) -> Option<Arc<ResponseStore>> {
        self.current.read().await.clone()
    }

    /// Make `store`'s generation current immediately.
    pub async fn take_over(&self, store: Arc<ResponseStore>) {
        let mut current = self.current.write().await;
        match current.as_ref() {
            Some(previous) => tracing::info!(
                from = %previous.generation(),
                to = %store.generation(),
                "generation taking over"
            ),
            None => tracing::info!(generation = %store.generation(), "generation active"),
        }
        *current = Some(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubFetch;

    #[tokio::test]
    async fn test_no_store_until_take_over() {
        let state = ProxyState::new(AppConfig::default(), StubFetch::new()).unwrap();
        assert!(state.store().await.is_none());

        let v1 = Arc::new(ResponseStore::open_in_memory("v1").await.unwrap());
        state.take_over(v1).await;
        assert_eq!(state.store().await.unwrap().generation(), "v1");
    }

    #[tokio::test]
    async fn test_take_over_swaps_generation() {
        let state = ProxyState::new(AppConfig::default(), StubFetch::new()).unwrap();
        let v1 = Arc::new(ResponseStore::open_in_memory("v1").await.unwrap());
        let v2 = Arc::new(ResponseStore::open_in_memory("v2").await.unwrap());

        state.take_over(v1.clone()).await;
        let held = state.store().await.unwrap();

        state.take_over(v2).await;
        assert_eq!(state.store().await.unwrap().generation(), "v2");
        // a request that cloned the handle before the swap keeps v1
        assert_eq!(held.generation(), "v1");
    }

    #[tokio::test]
    async fn test_new_rejects_unparseable_origin() {
        let config = AppConfig { upstream_origin: "http://".into(), ..Default::default() };
        assert!(matches!(ProxyState::new(config, StubFetch::new()), Err(Error::InvalidUrl(_))));
    }
}
