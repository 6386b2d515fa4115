use crate::types::FileRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const HASH_STORE_SCHEMA_VERSION: u32 = 1;

/// Errors surfaced by hash store adapters.
///
/// Availability is a per-call result, not process-wide state: callers degrade
/// to a full rescan on [`StoreError::Unavailable`] and retry the commit on a
/// later run.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("hash store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Persistence port for the path→hash map owned by the change detector.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Fetch the persisted record for one path, if any.
    async fn get(&self, project_id: &str, path: &str) -> Result<Option<FileRecord>, StoreError>;

    /// Replace the persisted map for a project. Records expire after `ttl`
    /// so abandoned projects age out rather than growing unbounded.
    async fn set_all(
        &self,
        project_id: &str,
        records: Vec<FileRecord>,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// All paths currently tracked for a project.
    async fn list_known_paths(&self, project_id: &str) -> Result<Vec<String>, StoreError>;

    /// Remove a single path from the persisted map.
    async fn delete(&self, project_id: &str, path: &str) -> Result<(), StoreError>;
}

pub(crate) fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

// ── In-memory adapter ───────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
struct StoredRecord {
    record: FileRecord,
    expires_unix_ms: u64,
}

impl StoredRecord {
    fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_unix_ms
    }
}

/// Hash store backed by a process-local map. Intended for tests and
/// single-shot runs that don't need cross-run persistence.
#[derive(Default)]
pub struct MemoryHashStore {
    projects: Mutex<HashMap<String, HashMap<String, StoredRecord>>>,
}

impl MemoryHashStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HashStore for MemoryHashStore {
    async fn get(&self, project_id: &str, path: &str) -> Result<Option<FileRecord>, StoreError> {
        let now = unix_ms_now();
        let projects = self.projects.lock().expect("hash store lock poisoned");
        Ok(projects
            .get(project_id)
            .and_then(|records| records.get(path))
            .filter(|stored| !stored.expired(now))
            .map(|stored| stored.record.clone()))
    }

    async fn set_all(
        &self,
        project_id: &str,
        records: Vec<FileRecord>,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires = unix_ms_now().saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        let mut projects = self.projects.lock().expect("hash store lock poisoned");
        let entry = projects.entry(project_id.to_string()).or_default();
        entry.clear();
        for record in records {
            entry.insert(
                record.path.clone(),
                StoredRecord {
                    record,
                    expires_unix_ms: expires,
                },
            );
        }
        Ok(())
    }

    async fn list_known_paths(&self, project_id: &str) -> Result<Vec<String>, StoreError> {
        let now = unix_ms_now();
        let projects = self.projects.lock().expect("hash store lock poisoned");
        let mut paths: Vec<String> = projects
            .get(project_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, stored)| !stored.expired(now))
                    .map(|(path, _)| path.clone())
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();
        Ok(paths)
    }

    async fn delete(&self, project_id: &str, path: &str) -> Result<(), StoreError> {
        let mut projects = self.projects.lock().expect("hash store lock poisoned");
        if let Some(records) = projects.get_mut(project_id) {
            records.remove(path);
        }
        Ok(())
    }
}

// ── JSON file adapter ───────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct ProjectFile {
    schema_version: u32,
    records: HashMap<String, StoredRecord>,
}

/// Hash store persisted as one JSON file per project under a base
/// directory. Writes go through a tmp file and an atomic rename; expired
/// records are dropped on load.
#[derive(Clone, Debug)]
pub struct JsonHashStore {
    base_dir: PathBuf,
}

impl JsonHashStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn project_path(&self, project_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", safe_component(project_id)))
    }

    async fn load_project(&self, project_id: &str) -> Result<HashMap<String, StoredRecord>, StoreError> {
        let path = self.project_path(project_id);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        let file: ProjectFile = match serde_json::from_str(&json) {
            Ok(file) => file,
            Err(e) => {
                log::warn!(
                    "Corrupt hash store file {}: {e}; starting fresh",
                    path.display()
                );
                return Ok(HashMap::new());
            }
        };
        if file.schema_version != HASH_STORE_SCHEMA_VERSION {
            log::warn!(
                "Hash store schema mismatch for {project_id} (found {}, expected {HASH_STORE_SCHEMA_VERSION}); discarding",
                file.schema_version
            );
            return Ok(HashMap::new());
        }
        let now = unix_ms_now();
        let before = file.records.len();
        let records: HashMap<String, StoredRecord> = file
            .records
            .into_iter()
            .filter(|(_, stored)| !stored.expired(now))
            .collect();
        if records.len() < before {
            log::debug!(
                "Dropped {} expired hash records for {project_id}",
                before - records.len()
            );
        }
        Ok(records)
    }

    async fn save_project(
        &self,
        project_id: &str,
        records: HashMap<String, StoredRecord>,
    ) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;
        let path = self.project_path(project_id);
        let file = ProjectFile {
            schema_version: HASH_STORE_SCHEMA_VERSION,
            records,
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl HashStore for JsonHashStore {
    async fn get(&self, project_id: &str, path: &str) -> Result<Option<FileRecord>, StoreError> {
        let records = self.load_project(project_id).await?;
        Ok(records.get(path).map(|stored| stored.record.clone()))
    }

    async fn set_all(
        &self,
        project_id: &str,
        records: Vec<FileRecord>,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires = unix_ms_now().saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        let stored: HashMap<String, StoredRecord> = records
            .into_iter()
            .map(|record| {
                (
                    record.path.clone(),
                    StoredRecord {
                        record,
                        expires_unix_ms: expires,
                    },
                )
            })
            .collect();
        self.save_project(project_id, stored).await
    }

    async fn list_known_paths(&self, project_id: &str) -> Result<Vec<String>, StoreError> {
        let records = self.load_project(project_id).await?;
        let mut paths: Vec<String> = records.into_keys().collect();
        paths.sort();
        Ok(paths)
    }

    async fn delete(&self, project_id: &str, path: &str) -> Result<(), StoreError> {
        let mut records = self.load_project(project_id).await?;
        if records.remove(path).is_some() {
            self.save_project(project_id, records).await?;
        }
        Ok(())
    }
}

fn safe_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}
