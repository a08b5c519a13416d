//! Generation lifecycle hooks.
//!
//! `install` provisions a generation the first time its name is seen and
//! makes it current immediately, without waiting for a restart.
//! `activate` then reclaims every other generation, so exactly one
//! survives. Both run to completion before the proxy starts accepting
//! connections.

use std::sync::Arc;

use outpost_client::canonicalize;
use outpost_core::store::{connection, generations};
use outpost_core::{Error, ResponseStore};
use tokio::task::JoinSet;

use crate::routing::snapshot;
use crate::state::ProxyState;

/// Install hook: open the configured generation, provision it on first
/// sight, and take over immediately.
///
/// Provisioning failure is non-fatal: the error is logged, the
/// generation still takes over, and the gaps backfill on later static
/// routing. Only a store that cannot be opened aborts installation.
pub async fn install(state: &ProxyState) -> Result<(), Error> {
    let generation = &state.config.generation;
    let fresh = !connection::db_path(&state.config.cache_dir, generation).exists();

    let store = Arc::new(ResponseStore::open(&state.config.cache_dir, generation).await?);

    if fresh {
        tracing::info!(%generation, resources = state.config.manifest.len(), "provisioning new generation");
        match provision(state, &store).await {
            Ok(()) => {
                let count = store.len().await.unwrap_or(0);
                tracing::info!(%generation, entries = count, "generation provisioned");
            }
            Err(err) => {
                tracing::error!(%generation, error = %err, "provisioning incomplete, gaps will backfill on static routing");
            }
        }
    }

    state.take_over(store).await;
    Ok(())
}

/// Activate hook: reclaim every generation except the current one.
///
/// Reclamation failure is logged, never propagated; stale generations
/// are retried at the next activation.
pub async fn activate(state: &ProxyState) {
    match generations::reclaim(&state.config.cache_dir, &state.config.generation).await {
        Ok(deleted) if deleted.is_empty() => {
            tracing::debug!(generation = %state.config.generation, "no stale generations to reclaim");
        }
        Ok(deleted) => {
            tracing::info!(generation = %state.config.generation, ?deleted, "reclaimed stale generations");
        }
        Err(err) => {
            tracing::error!(error = %err, "generation reclamation failed");
        }
    }
}

/// Fetch and store every manifest resource, concurrently.
///
/// All-or-nothing from the caller's perspective: any failed entry makes
/// the whole batch report `ProvisionIncomplete`, with every successful
/// entry already persisted.
pub async fn provision(state: &ProxyState, store: &Arc<ResponseStore>) -> Result<(), Error> {
    let mut failed = Vec::new();
    let mut set = JoinSet::new();

    for raw in &state.config.manifest {
        let url = match canonicalize(raw, &state.origin) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(resource = %raw, error = %err, "manifest entry is not a valid URL");
                failed.push(raw.clone());
                continue;
            }
        };

        let fetcher = state.fetcher.clone();
        let store = store.clone();
        let raw = raw.clone();
        set.spawn(async move {
            let result = async {
                let resp = fetcher.fetch("GET", &url).await?;
                if !resp.status.is_success() {
                    return Err(Error::FetchFailed(format!("status {}", resp.status.as_u16())));
                }
                store.put(&snapshot("GET", &url, &resp)).await
            }
            .await;
            (raw, result)
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((raw, Err(err))) => {
                tracing::warn!(resource = %raw, error = %err, "manifest fetch failed");
                failed.push(raw);
            }
            Err(err) => {
                tracing::error!(error = %err, "provisioning task failed");
                failed.push("(provisioning task)".to_string());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        failed.sort();
        Err(Error::ProvisionIncomplete { failed })
    }
}
