//! Versioned envelope for persisted records.
//!
//! Every record is written as `{"schemaVersion": N, "payload": ...}`. On read,
//! a payload with the current version is decoded directly; anything else
//! (an older version, or a bare value written before envelopes existed) is
//! handed to [`Record::migrate`]. Unreadable values are logged and treated as
//! absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use streamflix_common::Result;

use super::Storage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub schema_version: u32,
    pub payload: T,
}

/// A value persisted through an [`Envelope`].
pub trait Record: Serialize + DeserializeOwned {
    const SCHEMA_VERSION: u32;

    /// Rebuild a record from a payload of another version.
    ///
    /// `version` is `None` for a bare value written without an envelope.
    fn migrate(version: Option<u32>, payload: Value) -> Option<Self> {
        let _ = (version, payload);
        None
    }
}

/// Decode a stored string into a record, migrating older layouts.
pub fn decode_record<R: Record>(raw: &str) -> Option<R> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Discarding corrupt persisted record: {}", e);
            return None;
        }
    };

    let version = value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok());

    match (version, value) {
        (Some(version), Value::Object(mut map)) if map.contains_key("payload") => {
            let payload = map.remove("payload").unwrap_or(Value::Null);
            if version == R::SCHEMA_VERSION {
                serde_json::from_value(payload)
                    .inspect_err(|e| tracing::warn!("Discarding unreadable record: {}", e))
                    .ok()
            } else {
                let migrated = R::migrate(Some(version), payload);
                if migrated.is_none() {
                    tracing::warn!(version, "No migration for persisted record version");
                }
                migrated
            }
        }
        (_, bare) => {
            let migrated = R::migrate(None, bare);
            if migrated.is_none() {
                tracing::warn!("Discarding unversioned persisted record");
            }
            migrated
        }
    }
}

/// Read and decode the record stored under `key`.
pub fn read_record<R: Record>(storage: &dyn Storage, key: &str) -> Option<R> {
    let raw = storage.get(key)?;
    decode_record(&raw)
}

/// Encode `record` in an envelope and store it under `key`.
pub fn write_record<R: Record>(storage: &dyn Storage, key: &str, record: &R) -> Result<()> {
    let envelope = Envelope {
        schema_version: R::SCHEMA_VERSION,
        payload: record,
    };
    storage.set(key, serde_json::to_string(&envelope)?)
}
