use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use streamflix_common::MediaType;
use uuid::Uuid;

/// A catalog item offered to the watchlist.
///
/// Only `id` is required; anything else the catalog returned (`overview`,
/// `vote_average`, ...) rides along in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(
        default,
        rename = "media_type",
        alias = "mediaType",
        skip_serializing_if = "Option::is_none"
    )]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        rename = "poster_path",
        alias = "posterPath",
        skip_serializing_if = "Option::is_none"
    )]
    pub poster_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }
}

/// A saved watchlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
    /// Opaque per-entry id. Older saves used short random strings, so any
    /// string is kept and anything else is replaced.
    #[serde(default = "new_unique_id", deserialize_with = "unique_id_or_new")]
    pub unique_id: String,
}

impl WatchlistItem {
    pub fn new(item: CatalogItem, added_at: DateTime<Utc>) -> Self {
        Self {
            item,
            added_at,
            unique_id: new_unique_id(),
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Title, falling back to a `name` field as TV results use.
    pub fn display_title(&self) -> Option<&str> {
        self.item
            .title
            .as_deref()
            .or_else(|| self.item.extra.get("name").and_then(Value::as_str))
    }

    /// A field by its wire name, for sorting on arbitrary attributes.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.item.id.clone())),
            "title" => self.display_title().map(|t| Value::String(t.to_string())),
            "addedAt" => Some(Value::String(self.added_at.to_rfc3339())),
            _ => self.item.extra.get(name).cloned(),
        }
    }
}

fn new_unique_id() -> String {
    Uuid::new_v4().to_string()
}

fn unique_id_or_new<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => s,
        _ => new_unique_id(),
    })
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
