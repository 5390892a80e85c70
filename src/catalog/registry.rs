//! Registry of [`CatalogProvider`] implementations.
//!
//! The [`CatalogRegistry`] queries every available provider concurrently and
//! merges the results. Entries that share a media type and id are kept once,
//! in the order of the provider that returned them first.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use streamflix_common::MediaType;
use tracing::warn;

use super::CatalogProvider;
use crate::http::FetchError;
use crate::watchlist::CatalogItem;

/// A registry that manages multiple [`CatalogProvider`] implementations.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use streamflix::catalog::CatalogRegistry;
///
/// let mut registry = CatalogRegistry::new();
/// registry.register(Arc::new(anime_client));
///
/// let results = registry.search("frieren", 1).await?;
/// ```
pub struct CatalogRegistry {
    providers: Vec<Arc<dyn CatalogProvider>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a provider. Merged results follow registration order.
    pub fn register(&mut self, provider: Arc<dyn CatalogProvider>) {
        self.providers.push(provider);
    }

    /// Providers that are currently able to serve requests.
    pub fn available(&self) -> Vec<&dyn CatalogProvider> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.as_ref())
            .collect()
    }

    /// Look up a provider by its [`CatalogProvider::name`].
    pub fn get(&self, name: &str) -> Option<&dyn CatalogProvider> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Search every available provider.
    ///
    /// A provider that fails is logged and skipped; the call only fails when
    /// every provider did.
    pub async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        let available = self.available();
        let results = join_all(available.iter().map(|p| p.search(query, page))).await;
        merge(&available, results)
    }

    /// Trending listings from every available provider.
    pub async fn trending(&self) -> Result<Vec<CatalogItem>, FetchError> {
        let available = self.available();
        let results = join_all(available.iter().map(|p| p.trending())).await;
        merge(&available, results)
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(
    providers: &[&dyn CatalogProvider],
    results: Vec<Result<Vec<CatalogItem>, FetchError>>,
) -> Result<Vec<CatalogItem>, FetchError> {
    let mut seen = HashSet::<(Option<MediaType>, String)>::new();
    let mut merged = Vec::new();
    let mut last_error = None;
    let mut succeeded = results.is_empty();

    for (provider, result) in providers.iter().zip(results) {
        match result {
            Ok(items) => {
                succeeded = true;
                for item in items {
                    if seen.insert((item.media_type, item.id.clone())) {
                        merged.push(item);
                    }
                }
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Catalog provider failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !succeeded => Err(e),
        _ => Ok(merged),
    }
}
