//! Persisted watchlist.
//!
//! Items are kept newest first and written through to storage on every
//! change. A stored list that cannot be read is logged and replaced by an
//! empty one.

mod item;

pub use item::{CatalogItem, WatchlistItem};

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use streamflix_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::storage::{read_record, write_record, Record, Storage};

/// Storage key of the watchlist.
pub const WATCHLIST_KEY: &str = "streamflix_watchlist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    AddedAt,
    Title,
    /// Any other attribute by wire name, e.g. `vote_average`.
    Field(String),
}

impl std::str::FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "addedAt" | "added_at" | "added" => Self::AddedAt,
            "title" | "name" => Self::Title,
            "" => return Err(Error::invalid_input("empty sort key")),
            other => Self::Field(other.to_string()),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct StoredList(Vec<WatchlistItem>);

impl Record for StoredList {
    const SCHEMA_VERSION: u32 = 1;

    /// Unversioned lists are bare arrays of items.
    fn migrate(version: Option<u32>, payload: Value) -> Option<Self> {
        match (version, payload) {
            (None, Value::Array(values)) => Some(Self(parse_items(values))),
            _ => None,
        }
    }
}

/// Parse items one by one, dropping those without a usable id.
fn parse_items(values: Vec<Value>) -> Vec<WatchlistItem> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<WatchlistItem>(value) {
            Ok(item) if !item.id().is_empty() => Some(item),
            Ok(_) => None,
            Err(e) => {
                warn!("Skipping invalid watchlist item: {}", e);
                None
            }
        })
        .collect()
}

pub struct Watchlist {
    storage: Arc<dyn Storage>,
    items: RwLock<Vec<WatchlistItem>>,
}

impl Watchlist {
    /// Load the saved watchlist from `storage`.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let items = read_record::<StoredList>(storage.as_ref(), WATCHLIST_KEY)
            .map(|list| list.0)
            .unwrap_or_default();
        debug!(count = items.len(), "Loaded watchlist");
        Self {
            storage,
            items: RwLock::new(items),
        }
    }

    fn persist(&self, items: &[WatchlistItem]) {
        let list = StoredList(items.to_vec());
        if let Err(e) = write_record(self.storage.as_ref(), WATCHLIST_KEY, &list) {
            tracing::error!("Failed to persist watchlist: {}", e);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.read().iter().any(|i| i.id() == id)
    }

    /// Add an item to the front of the list.
    ///
    /// Returns `false` for an item without an id or one already present.
    pub fn add(&self, item: CatalogItem) -> bool {
        if item.id.is_empty() {
            warn!("Invalid item for watchlist");
            return false;
        }
        let mut items = self.items.write();
        if items.iter().any(|i| i.id() == item.id) {
            warn!(id = %item.id, "Item already in watchlist");
            return false;
        }
        info!(id = %item.id, "Added to watchlist");
        items.insert(0, WatchlistItem::new(item, Utc::now()));
        self.persist(&items);
        true
    }

    /// Remove an item; returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|i| i.id() != id);
        let removed = items.len() != before;
        if removed {
            self.persist(&items);
        }
        removed
    }

    /// Add the item if absent, remove it if present. Returns whether the item
    /// is in the list afterwards.
    pub fn toggle(&self, item: CatalogItem) -> bool {
        if self.contains(&item.id) {
            self.remove(&item.id);
            false
        } else {
            self.add(item)
        }
    }

    pub fn clear(&self) {
        let mut items = self.items.write();
        items.clear();
        self.persist(&items);
    }

    /// Merge `updates` into the item's fields.
    pub fn update(&self, id: &str, updates: Map<String, Value>) -> Result<bool> {
        let mut items = self.items.write();
        let Some(slot) = items.iter_mut().find(|i| i.id() == id) else {
            return Ok(false);
        };

        let mut merged = match serde_json::to_value(&*slot)? {
            Value::Object(map) => map,
            _ => return Err(Error::internal("watchlist item is not an object")),
        };
        merged.extend(updates);
        let updated: WatchlistItem = serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::invalid_input(format!("invalid watchlist update: {e}")))?;
        if updated.id().is_empty() {
            return Err(Error::invalid_input("watchlist item id cannot be empty"));
        }

        *slot = updated;
        self.persist(&items);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn items(&self) -> Vec<WatchlistItem> {
        self.items.read().clone()
    }

    /// Reorder the saved list.
    pub fn sort(&self, key: &SortKey, order: SortOrder) {
        let mut items = self.items.write();
        items.sort_by(|a, b| {
            let ord = compare_by(a, b, key);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        self.persist(&items);
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<WatchlistItem>
    where
        F: Fn(&WatchlistItem) -> bool,
    {
        self.items
            .read()
            .iter()
            .filter(|i| predicate(i))
            .cloned()
            .collect()
    }

    /// The list as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.items.read())?)
    }

    /// Replace the list with items from a JSON array.
    ///
    /// Entries without an id are dropped. Returns the number kept.
    pub fn import_json(&self, json: &str) -> Result<usize> {
        let values = match serde_json::from_str::<Value>(json)? {
            Value::Array(values) => values,
            _ => return Err(Error::invalid_input("watchlist import must be a JSON array")),
        };
        let imported = parse_items(values);
        let count = imported.len();

        let mut items = self.items.write();
        *items = imported;
        self.persist(&items);
        info!(count, "Imported watchlist");
        Ok(count)
    }
}

fn compare_by(a: &WatchlistItem, b: &WatchlistItem, key: &SortKey) -> Ordering {
    match key {
        SortKey::AddedAt => a.added_at.cmp(&b.added_at),
        SortKey::Title => a
            .display_title()
            .unwrap_or_default()
            .to_lowercase()
            .cmp(&b.display_title().unwrap_or_default().to_lowercase()),
        SortKey::Field(name) => compare_values(a.field(name).as_ref(), b.field(name).as_ref()),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn watchlist() -> (Watchlist, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (Watchlist::load(storage.clone()), storage)
    }

    #[test]
    fn add_prepends_and_rejects_duplicates() {
        let (list, _) = watchlist();
        assert!(list.add(CatalogItem::new("1").with_title("First")));
        assert!(list.add(CatalogItem::new("2").with_title("Second")));
        assert!(!list.add(CatalogItem::new("1")));
        assert!(!list.add(CatalogItem::new("")));

        let ids: Vec<_> = list.items().iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn changes_are_persisted_in_an_envelope() {
        let (list, storage) = watchlist();
        list.add(CatalogItem::new("603").with_title("The Matrix"));

        let raw: Value = serde_json::from_str(&storage.get(WATCHLIST_KEY).unwrap()).unwrap();
        assert_eq!(raw["schemaVersion"], 1);
        assert_eq!(raw["payload"][0]["id"], "603");

        let reloaded = Watchlist::load(storage);
        assert!(reloaded.contains("603"));
    }

    #[test]
    fn legacy_bare_array_is_migrated() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                WATCHLIST_KEY,
                r#"[{"id": 1, "title": "A", "addedAt": "2024-01-01T00:00:00Z"}, {"title": "no id"}]"#
                    .into(),
            )
            .unwrap();

        let list = Watchlist::load(storage);
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].id(), "1");
    }

    #[test]
    fn corrupt_storage_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(WATCHLIST_KEY, "[{broken".into()).unwrap();
        assert!(Watchlist::load(storage).is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let (list, _) = watchlist();
        assert!(list.toggle(CatalogItem::new("7")));
        assert!(list.contains("7"));
        assert!(!list.toggle(CatalogItem::new("7")));
        assert!(!list.contains("7"));
        assert!(!list.remove("7"));
    }

    #[test]
    fn update_merges_fields() {
        let (list, _) = watchlist();
        list.add(CatalogItem::new("1").with_title("Old"));

        let mut updates = Map::new();
        updates.insert("title".into(), Value::from("New"));
        updates.insert("watched".into(), Value::from(true));
        assert!(list.update("1", updates).unwrap());
        assert!(!list.update("missing", Map::new()).unwrap());

        let item = &list.items()[0];
        assert_eq!(item.item.title.as_deref(), Some("New"));
        assert_eq!(item.item.extra["watched"], true);
    }

    #[test]
    fn sort_by_title_and_field() {
        let (list, _) = watchlist();
        let mut b = CatalogItem::new("b").with_title("beta");
        b.extra.insert("vote_average".into(), Value::from(9.1));
        let mut a = CatalogItem::new("a").with_title("Alpha");
        a.extra.insert("vote_average".into(), Value::from(6.5));
        list.add(b);
        list.add(a);

        list.sort(&SortKey::Title, SortOrder::Asc);
        assert_eq!(list.items()[0].id(), "a");

        list.sort(&SortKey::Field("vote_average".into()), SortOrder::Desc);
        assert_eq!(list.items()[0].id(), "b");
    }

    #[test]
    fn sort_by_added_at() {
        let (list, _) = watchlist();
        list.import_json(
            r#"[
                {"id": "old", "addedAt": "2023-05-01T00:00:00Z"},
                {"id": "new", "addedAt": "2024-05-01T00:00:00Z"},
                {"id": "mid", "addedAt": "2023-12-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();

        list.sort(&SortKey::AddedAt, SortOrder::Desc);
        let ids: Vec<_> = list.items().iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);

        list.sort(&"addedAt".parse().unwrap(), SortOrder::Asc);
        assert_eq!(list.items()[0].id(), "old");
    }

    #[test]
    fn filter_and_clear() {
        let (list, _) = watchlist();
        list.add(CatalogItem::new("1").with_media_type(streamflix_common::MediaType::Movie));
        list.add(CatalogItem::new("2").with_media_type(streamflix_common::MediaType::Tv));

        let movies = list.filter(|i| i.item.media_type == Some(streamflix_common::MediaType::Movie));
        assert_eq!(movies.len(), 1);

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn export_then_import() {
        let (list, _) = watchlist();
        list.add(CatalogItem::new("1").with_title("One"));
        list.add(CatalogItem::new("2").with_title("Two"));
        let exported = list.export_json().unwrap();
        assert!(exported.contains("\n  "), "export is pretty printed");

        let (other, _) = watchlist();
        assert_eq!(other.import_json(&exported).unwrap(), 2);
        assert_eq!(other.items(), list.items());

        assert!(other.import_json(r#"{"id": 1}"#).is_err());
        assert!(other.import_json("not json").is_err());
        assert_eq!(other.len(), 2, "failed import leaves the list alone");
    }
}
