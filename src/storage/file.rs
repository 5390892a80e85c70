//! Storage backed by a single JSON object on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use streamflix_common::Result;

use super::Storage;

/// Keeps every value in memory and rewrites the file on each change.
///
/// A missing file starts empty. A file that cannot be parsed is logged and
/// also starts empty; it is overwritten on the next write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match load_from_file(&path) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Failed to load persisted storage {:?}: {}", path, e);
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        save_to_file(&self.path, values).inspect_err(|e| {
            tracing::error!("Failed to persist storage {:?}: {}", self.path, e);
        })
    }
}

fn load_from_file(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&content)?)
}

fn save_to_file(path: &Path, values: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(values)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut values = self.values.write();
        let previous = values.insert(key.to_string(), value);
        self.persist(&values).inspect_err(|_| match previous {
            Some(previous) => {
                values.insert(key.to_string(), previous);
            }
            None => {
                values.remove(key);
            }
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write();
        if let Some(previous) = values.remove(key) {
            self.persist(&values).inspect_err(|_| {
                values.insert(key.to_string(), previous);
            })?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }
}
