//! Watch progress records.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use streamflix_common::Result;

use crate::storage::{read_record, write_record, Record, Storage};

const KEY_PREFIX: &str = "watch-progress-";

/// Storage key for one episode's progress.
pub fn progress_key(content_id: &str, episode: u32) -> String {
    format!("{KEY_PREFIX}{content_id}-{episode}")
}

/// Last known position in an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub position_seconds: f64,
    pub duration_seconds: Option<f64>,
    pub saved_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Fraction watched, when the duration is known.
    pub fn fraction(&self) -> Option<f64> {
        self.duration_seconds
            .filter(|d| *d > 0.0)
            .map(|d| (self.position_seconds / d).clamp(0.0, 1.0))
    }
}

impl Record for ProgressRecord {
    const SCHEMA_VERSION: u32 = 1;

    /// Unversioned records are `{time, duration, timestamp}` with a
    /// millisecond epoch timestamp.
    fn migrate(version: Option<u32>, payload: Value) -> Option<Self> {
        if version.is_some() {
            return None;
        }
        let position_seconds = payload.get("time")?.as_f64()?;
        let saved_at = DateTime::from_timestamp_millis(payload.get("timestamp")?.as_i64()?)?;
        let duration_seconds = payload
            .get("duration")
            .and_then(Value::as_f64)
            .filter(|d| d.is_finite() && *d > 0.0);
        Some(Self {
            position_seconds,
            duration_seconds,
            saved_at,
        })
    }
}

/// When a saved position is worth resuming from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumePolicy {
    /// Positions at or below this are treated as "not started".
    pub min_position: Duration,
    /// Records older than this are ignored.
    pub max_age: Duration,
}

impl Default for ResumePolicy {
    fn default() -> Self {
        Self {
            min_position: Duration::from_secs(10),
            max_age: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl ResumePolicy {
    pub fn allows(&self, record: &ProgressRecord, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(record.saved_at);
        let fresh = age.to_std().map_or(true, |age| age < self.max_age);
        fresh && record.position_seconds > self.min_position.as_secs_f64()
    }
}

/// Reads and writes watch progress through a [`Storage`] backend.
#[derive(Clone)]
pub struct ProgressStore {
    storage: Arc<dyn Storage>,
    policy: ResumePolicy,
}

impl ProgressStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_policy(storage, ResumePolicy::default())
    }

    pub fn with_policy(storage: Arc<dyn Storage>, policy: ResumePolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> ResumePolicy {
        self.policy
    }

    pub fn load(&self, content_id: &str, episode: u32) -> Option<ProgressRecord> {
        read_record(self.storage.as_ref(), &progress_key(content_id, episode))
    }

    /// Overwrite the saved position for an episode.
    pub fn save(
        &self,
        content_id: &str,
        episode: u32,
        position_seconds: f64,
        duration_seconds: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let record = ProgressRecord {
            position_seconds,
            duration_seconds,
            saved_at: now,
        };
        write_record(self.storage.as_ref(), &progress_key(content_id, episode), &record)
    }

    /// Position to resume from, judged against the current time.
    pub fn resume_position(&self, content_id: &str, episode: u32) -> Option<f64> {
        self.resume_position_at(content_id, episode, Utc::now())
    }

    /// Position to resume from, judged against `now`.
    pub fn resume_position_at(
        &self,
        content_id: &str,
        episode: u32,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        self.load(content_id, episode)
            .filter(|record| self.policy.allows(record, now))
            .map(|record| record.position_seconds)
    }

    pub fn clear(&self, content_id: &str, episode: u32) -> Result<()> {
        self.storage.remove(&progress_key(content_id, episode))
    }

    /// Every saved record whose key starts with the progress prefix, by key.
    pub fn entries(&self) -> Vec<(String, ProgressRecord)> {
        self.storage
            .keys_with_prefix(KEY_PREFIX)
            .into_iter()
            .filter_map(|key| {
                let record = read_record(self.storage.as_ref(), &key)?;
                let name = key.trim_start_matches(KEY_PREFIX).to_string();
                Some((name, record))
            })
            .collect()
    }
}
