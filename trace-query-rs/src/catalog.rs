//! Cached service and route metadata
//!
//! The catalog is populated lazily on the first translation and then kept
//! for the lifetime of the value. It is only re-fetched while empty.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::core::MetadataSource;
use crate::error::Result;

/// Point-in-time copy of the catalog, used for prompt rendering and validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl CatalogSnapshot {
    pub fn new(entries: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { entries }
    }

    /// Known service names, sorted
    pub fn services(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.entries.contains_key(service)
    }

    /// Known routes of `service`; empty for unknown services
    pub fn routes_of(&self, service: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(service)
    }

    pub fn has_route(&self, service: &str, route: &str) -> bool {
        self.entries
            .get(service)
            .map(|routes| routes.contains(route))
            .unwrap_or(false)
    }

    pub fn entries(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S, R> FromIterator<(S, R)> for CatalogSnapshot
where
    S: Into<String>,
    R: IntoIterator,
    R::Item: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, R)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(service, routes)| {
                    (service.into(), routes.into_iter().map(Into::into).collect())
                })
                .collect(),
        )
    }
}

/// Service catalog backed by a metadata source
pub struct ServiceCatalog {
    source: Arc<dyn MetadataSource>,
    cache: RwLock<BTreeMap<String, BTreeSet<String>>>,

    /// Held while populating so concurrent first callers share one fan-out
    populate: Mutex<()>,
}

impl ServiceCatalog {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(BTreeMap::new()),
            populate: Mutex::new(()),
        }
    }

    /// Populate the cache if it is empty.
    ///
    /// Fails only when the service list cannot be fetched. A failed
    /// operations fetch leaves that service with no routes.
    pub async fn ensure_loaded(&self) -> Result<()> {
        if !self.cache.read().await.is_empty() {
            return Ok(());
        }

        let _guard = self.populate.lock().await;

        // Another caller may have populated while we waited
        if !self.cache.read().await.is_empty() {
            return Ok(());
        }

        let services = self.source.list_services().await?;
        debug!("Fetching operations for {} services", services.len());

        let fetches = services.iter().map(|service| {
            let source = Arc::clone(&self.source);
            async move { (service, source.list_operations(service).await) }
        });

        let mut entries = BTreeMap::new();
        let mut degraded = 0usize;
        for (service, result) in join_all(fetches).await {
            let routes = match result {
                Ok(operations) => operations.into_iter().collect(),
                Err(e) => {
                    degraded += 1;
                    warn!("Failed to fetch operations for service '{}': {}", service, e);
                    BTreeSet::new()
                }
            };
            entries.insert(service.clone(), routes);
        }

        info!(
            "Service catalog loaded: {} services ({} without route metadata)",
            entries.len(),
            degraded
        );

        *self.cache.write().await = entries;
        Ok(())
    }

    /// Known service names, sorted
    pub async fn services(&self) -> BTreeSet<String> {
        self.cache.read().await.keys().cloned().collect()
    }

    /// Known routes of `service`; empty for unknown services
    pub async fn routes_of(&self, service: &str) -> BTreeSet<String> {
        self.cache
            .read()
            .await
            .get(service)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(self.cache.read().await.clone())
    }

    pub async fn is_loaded(&self) -> bool {
        !self.cache.read().await.is_empty()
    }

    pub async fn service_count(&self) -> usize {
        self.cache.read().await.len()
    }
}
