//! Key/value persistence for watch progress, preferences and the watchlist.
//!
//! Values are stored as raw strings, exactly as a browser's local storage
//! would hold them, so a backend can contain anything, including text that is
//! no longer valid JSON. Typed access goes through [`read_record`] and
//! [`write_record`], which wrap each value in a versioned envelope.

mod envelope;
mod file;

pub use envelope::{decode_record, read_record, write_record, Envelope, Record};
pub use file::FileStorage;

use std::collections::BTreeMap;

use parking_lot::RwLock;
use streamflix_common::Result;

/// A string-keyed store of string values.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// All keys, in sorted order.
    fn keys(&self) -> Vec<String>;

    /// Keys starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }
}

/// Volatile storage, for tests and `--no-persist` sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }
}
