//! Catalog sources behind one interface.
//!
//! This module defines the [`CatalogProvider`] trait that the anime and
//! movie/TV clients implement, and [`CatalogRegistry`], which queries every
//! available provider at once.

mod registry;

pub use registry::CatalogRegistry;

use async_trait::async_trait;
use serde_json::{Map, Value};
use streamflix_common::MediaType;

use crate::http::FetchError;
use crate::watchlist::CatalogItem;

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait for a searchable catalog.
///
/// Implementations route every request through their response cache, so
/// repeated queries within the TTL are free. A cancelled request yields an
/// empty list rather than an error.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider is configured and can serve requests.
    fn is_available(&self) -> bool;

    /// Search the catalog for `query`.
    async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogItem>, FetchError>;

    /// What is popular right now.
    async fn trending(&self) -> Result<Vec<CatalogItem>, FetchError>;
}

// ---------------------------------------------------------------------------
// Listing conversion
// ---------------------------------------------------------------------------

/// Convert one listing entry into a [`CatalogItem`].
///
/// Returns `None` for entries without an id and for people in mixed search
/// results. `media_type` is used when the entry does not name its own.
pub fn item_from_listing(value: &Value, media_type: Option<MediaType>) -> Option<CatalogItem> {
    let record = value.as_object()?;
    let id = match record.get("id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let own_type = record.get("media_type").and_then(Value::as_str);
    if own_type == Some("person") {
        return None;
    }
    let media_type = own_type.and_then(|t| t.parse().ok()).or(media_type);

    let title = ["title", "name", "englishName"]
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str))
        .map(str::to_string);
    let poster_path = ["poster_path", "poster", "image"]
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str))
        .map(str::to_string);

    let extra: Map<String, Value> = record
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "id" | "title" | "media_type" | "poster_path"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(CatalogItem {
        id,
        media_type,
        title,
        poster_path,
        extra,
    })
}
