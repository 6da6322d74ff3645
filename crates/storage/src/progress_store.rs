//! Persisted progress under a single key, as a JSON array of
//! `{ "videoId", "progress", "started" }` objects.

use std::sync::Arc;

use course_core::model::{LectureId, ProgressRecord, ProgressSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::repository::{KeyValueStore, StorageError};

/// Wire shape of one record as written. `videoId` is the lecture id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredProgressRef<'a> {
    video_id: &'a str,
    progress: u8,
    started: bool,
}

impl<'a> StoredProgressRef<'a> {
    fn from_record(record: &'a ProgressRecord) -> Self {
        Self {
            video_id: record.lecture_id().as_str(),
            progress: record.progress_percent(),
            started: record.started(),
        }
    }
}

/// Wire shape of one record as read back. More lenient than what is written.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProgress {
    video_id: String,
    // Older writers could persist `null` when the duration was not loaded yet.
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    started: bool,
}

impl StoredProgress {
    fn into_record(self) -> Option<ProgressRecord> {
        let id = match LectureId::new(self.video_id) {
            Ok(id) => id,
            Err(err) => {
                debug!(error = %err, "dropping stored progress with invalid id");
                return None;
            }
        };
        #[allow(clippy::cast_possible_truncation)]
        let progress = self
            .progress
            .filter(|p| p.is_finite())
            .map_or(0, |p| p.round() as i64);
        Some(ProgressRecord::from_persisted(id, progress, self.started))
    }
}

/// Reads and writes the whole `ProgressSet` under one key.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted set.
    ///
    /// Missing, blank, unparsable or empty payloads all yield `Ok(None)` so the
    /// caller can fall back to zeroed defaults.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend itself cannot be read.
    pub async fn load(&self) -> Result<Option<ProgressSet>, StorageError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            debug!(key = %self.key, "no stored progress");
            return Ok(None);
        };
        Ok(decode(&self.key, &raw))
    }

    /// Overwrite the stored set with `progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save(&self, progress: &ProgressSet) -> Result<(), StorageError> {
        let payload = encode(progress)?;
        self.kv.set(&self.key, &payload).await?;
        debug!(key = %self.key, records = progress.len(), "saved progress");
        Ok(())
    }

    /// Forget all stored progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key).await
    }
}

fn encode(progress: &ProgressSet) -> Result<String, StorageError> {
    let stored: Vec<StoredProgressRef<'_>> = progress
        .records()
        .iter()
        .map(StoredProgressRef::from_record)
        .collect();
    serde_json::to_string(&stored).map_err(|err| StorageError::Serialization(err.to_string()))
}

fn decode(key: &str, raw: &str) -> Option<ProgressSet> {
    if raw.trim().is_empty() {
        return None;
    }

    let stored: Vec<StoredProgress> = match serde_json::from_str(raw) {
        Ok(stored) => stored,
        Err(err) => {
            warn!(key, error = %err, "stored progress is corrupt; ignoring it");
            return None;
        }
    };

    let records: Vec<ProgressRecord> = stored
        .into_iter()
        .filter_map(StoredProgress::into_record)
        .collect();
    if records.is_empty() {
        return None;
    }
    Some(ProgressSet::from_records(records))
}
