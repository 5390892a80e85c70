//! Pulling lists and records out of catalog responses.
//!
//! The catalog service has shipped several response layouts over time. Rather
//! than sniffing shapes inline, each known layout is a named strategy; the
//! first one that matches wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One way of locating the result list inside a response.
#[derive(Clone, Copy)]
pub struct ListStrategy {
    pub name: &'static str,
    locate: fn(&Value) -> Option<&Vec<Value>>,
}

impl ListStrategy {
    pub fn locate<'a>(&self, data: &'a Value) -> Option<&'a Vec<Value>> {
        (self.locate)(data)
    }
}

impl std::fmt::Debug for ListStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ListStrategy").field(&self.name).finish()
    }
}

/// Known list layouts, in the order they are tried.
pub const LIST_STRATEGIES: [ListStrategy; 5] = [
    ListStrategy {
        name: "data.response",
        locate: |v| v.get("data")?.get("response")?.as_array(),
    },
    ListStrategy {
        name: "array",
        locate: Value::as_array,
    },
    ListStrategy {
        name: "results",
        locate: |v| v.get("results")?.as_array(),
    },
    ListStrategy {
        name: "anime",
        locate: |v| v.get("anime")?.as_array(),
    },
    ListStrategy {
        name: "data",
        locate: |v| v.get("data")?.as_array(),
    },
];

/// The result list of a search or browse response, empty when no layout
/// matches.
pub fn extract_list(data: &Value) -> Vec<Value> {
    for strategy in &LIST_STRATEGIES {
        if let Some(items) = strategy.locate(data) {
            debug!(strategy = strategy.name, count = items.len(), "Extracted result list");
            return items.clone();
        }
    }
    debug!("No result list in response");
    Vec::new()
}

/// An episode entry as the player consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub is_filler: bool,
}

/// Normalize an episode list response.
///
/// Missing ids and numbers fall back to the 1-based position; missing titles
/// become `Episode N`.
pub fn normalize_episodes(data: &Value) -> Vec<Episode> {
    let items = data
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| data.as_array())
        .or_else(|| data.get("episodes").and_then(Value::as_array));

    let Some(items) = items else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(index, ep)| {
            let position = index as u32 + 1;
            let number = ["episodeNumber", "number", "episode", "ep"]
                .iter()
                .find_map(|field| ep.get(*field).and_then(positive_number))
                .unwrap_or(position);
            let id = ["id", "episodeId"]
                .iter()
                .find_map(|field| ep.get(*field).and_then(non_empty_text))
                .unwrap_or_else(|| position.to_string());
            let title = ["title", "alternativeTitle", "name"]
                .iter()
                .find_map(|field| ep.get(*field).and_then(non_empty_text))
                .unwrap_or_else(|| format!("Episode {number}"));
            let is_filler = ep.get("isFiller").and_then(Value::as_bool).unwrap_or(false);

            Episode {
                id,
                number,
                title,
                is_filler,
            }
        })
        .collect()
}

/// Normalize an anime details response into a single record carrying `id`.
pub fn normalize_details(data: &Value, id: &str) -> Value {
    if let Some(inner) = data.get("data").and_then(Value::as_object) {
        return normalize_detail_record(inner, id);
    }

    if let Some(items) = data
        .as_array()
        .or_else(|| data.get("results").and_then(Value::as_array))
    {
        let matched = items
            .iter()
            .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
            .or_else(|| items.first())
            .and_then(Value::as_object);
        return match matched {
            Some(record) => with_id(record.clone(), id),
            None if data.is_array() => serde_json::json!({ "id": id, "episodes": [] }),
            None => with_id(data.as_object().cloned().unwrap_or_default(), id),
        };
    }

    match data.as_object() {
        Some(record) => with_id(record.clone(), id),
        None => serde_json::json!({ "id": id }),
    }
}

fn normalize_detail_record(record: &Map<String, Value>, id: &str) -> Value {
    let mut out = record.clone();
    let field = |name: &str| record.get(name).filter(|v| !v.is_null()).cloned();

    if let Some(poster) = field("poster") {
        out.insert("image".into(), poster);
    }
    out.insert(
        "genres".into(),
        field("genres").unwrap_or_else(|| Value::Array(Vec::new())),
    );
    let description = field("description")
        .filter(|d| d.as_str().is_some_and(|s| !s.is_empty()))
        .or_else(|| field("synopsis"))
        .unwrap_or_else(|| Value::String(String::new()));
    out.insert("description".into(), description);

    let total = record
        .get("episodes")
        .and_then(|eps| {
            ["eps", "sub", "dub"]
                .iter()
                .find_map(|k| eps.get(*k).filter(|v| truthy(v)).cloned())
        })
        .unwrap_or_else(|| Value::String("Unknown".into()));
    out.insert("totalEpisodes".into(), total);

    with_id(out, id)
}

fn with_id(mut record: Map<String, Value>, id: &str) -> Value {
    if !record.get("id").is_some_and(truthy) {
        record.insert("id".into(), Value::String(id.to_string()));
    }
    Value::Object(record)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn positive_number(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n > 0)
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
