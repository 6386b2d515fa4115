use crate::error::Result;
use crate::store::{unix_ms_now, HashStore, StoreError};
use crate::types::{ChangeSet, FileRecord, ScannedFile};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a persisted file record. Abandoned projects age out
/// of the store instead of accumulating forever.
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// SHA-256 hex fingerprint of file content.
///
/// Deliberately byte-sensitive: a comment-only edit must still mark the
/// file for reprocessing, even though chunk identity downstream is
/// computed from normalized content.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Classifies every tracked file as added/modified/deleted/unchanged using
/// a persisted path→hash map.
///
/// The detector owns the persisted map exclusively: it is read once per
/// run in [`detect`](ChangeDetector::detect) and written once in
/// [`commit`](ChangeDetector::commit). Concurrent runs against the same
/// project are not supported; the caller must enforce at most one run per
/// project at a time.
pub struct ChangeDetector {
    store: Arc<dyn HashStore>,
    ttl: Duration,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn HashStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_RECORD_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Compare the current scan against the persisted map.
    ///
    /// When the store is unavailable the detector degrades to "everything
    /// is modified" for this run and flags the change set accordingly; no
    /// commit should be attempted until the store recovers.
    pub async fn detect(&self, project_id: &str, current: &[ScannedFile]) -> Result<ChangeSet> {
        let known_paths = match self.store.list_known_paths(project_id).await {
            Ok(paths) => paths,
            Err(StoreError::Unavailable(reason)) => {
                log::warn!("Hash store unavailable for {project_id}: {reason}; falling back to full rescan");
                return Ok(Self::full_rescan(current));
            }
            Err(e) => return Err(e.into()),
        };

        let mut changes = ChangeSet::default();
        let current_paths: HashSet<&str> = current.iter().map(|f| f.path.as_str()).collect();

        for file in current {
            let hash = fingerprint(&file.content);
            let persisted = match self.store.get(project_id, &file.path).await {
                Ok(record) => record,
                Err(StoreError::Unavailable(reason)) => {
                    log::warn!("Hash store unavailable mid-detect for {project_id}: {reason}; falling back to full rescan");
                    return Ok(Self::full_rescan(current));
                }
                Err(e) => return Err(e.into()),
            };

            match persisted {
                None => changes.added.push(file.path.clone()),
                Some(record) if record.content_hash != hash => {
                    changes.modified.push(file.path.clone());
                }
                Some(_) => changes.unchanged += 1,
            }
        }

        for path in known_paths {
            if !current_paths.contains(path.as_str()) {
                changes.deleted.push(path);
            }
        }

        changes.added.sort();
        changes.modified.sort();
        changes.deleted.sort();

        log::info!(
            "Change detection for {project_id}: {} added, {} modified, {} deleted, {} unchanged",
            changes.added.len(),
            changes.modified.len(),
            changes.deleted.len(),
            changes.unchanged
        );
        Ok(changes)
    }

    /// Persist the new path→hash map after the caller has successfully
    /// reprocessed the changed files.
    ///
    /// Deleted paths are simply absent from `new_hashes`: replacing the
    /// whole map removes them regardless of downstream success, since
    /// there is nothing left to reprocess for them.
    pub async fn commit(&self, project_id: &str, new_hashes: &HashMap<String, (String, u64)>) -> Result<()> {
        let now = unix_ms_now();
        let records: Vec<FileRecord> = new_hashes
            .iter()
            .map(|(path, (hash, size))| FileRecord {
                path: path.clone(),
                content_hash: hash.clone(),
                size: *size,
                last_seen_unix_ms: now,
            })
            .collect();

        self.store.set_all(project_id, records, self.ttl).await?;
        log::debug!("Committed {} hash records for {project_id}", new_hashes.len());
        Ok(())
    }

    fn full_rescan(current: &[ScannedFile]) -> ChangeSet {
        let mut modified: Vec<String> = current.iter().map(|f| f.path.clone()).collect();
        modified.sort();
        ChangeSet {
            modified,
            full_rescan: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryHashStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct DownStore;

    #[async_trait]
    impl HashStore for DownStore {
        async fn get(&self, _: &str, _: &str) -> std::result::Result<Option<FileRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn set_all(
            &self,
            _: &str,
            _: Vec<FileRecord>,
            _: Duration,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn list_known_paths(&self, _: &str) -> std::result::Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn delete(&self, _: &str, _: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn files(entries: &[(&str, &str)]) -> Vec<ScannedFile> {
        entries
            .iter()
            .map(|(path, content)| ScannedFile::new(*path, *content))
            .collect()
    }

    fn hashes_for(entries: &[(&str, &str)]) -> HashMap<String, (String, u64)> {
        entries
            .iter()
            .map(|(path, content)| {
                (
                    path.to_string(),
                    (fingerprint(content), content.len() as u64),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn first_run_marks_everything_added() {
        let detector = ChangeDetector::new(Arc::new(MemoryHashStore::new()));
        let scan = files(&[("a.rs", "fn a() {}"), ("b.rs", "fn b() {}")]);

        let changes = detector.detect("p", &scan).await.unwrap();
        assert_eq!(changes.added, vec!["a.rs", "b.rs"]);
        assert_eq!(changes.unchanged, 0);
        assert!(!changes.full_rescan);
    }

    #[tokio::test]
    async fn rerun_on_unmodified_tree_is_idempotent() {
        let detector = ChangeDetector::new(Arc::new(MemoryHashStore::new()));
        let scan = files(&[("a.rs", "fn a() {}"), ("b.rs", "fn b() {}")]);

        let first = detector.detect("p", &scan).await.unwrap();
        assert_eq!(first.added.len(), 2);
        detector.commit("p", &hashes_for(&[("a.rs", "fn a() {}"), ("b.rs", "fn b() {}")])).await.unwrap();

        let second = detector.detect("p", &scan).await.unwrap();
        assert_eq!(second.added.len(), 0);
        assert_eq!(second.modified.len(), 0);
        assert_eq!(second.deleted.len(), 0);
        assert_eq!(second.unchanged, 2);
    }

    #[tokio::test]
    async fn single_edit_marks_exactly_one_modified() {
        let detector = ChangeDetector::new(Arc::new(MemoryHashStore::new()));
        let before = files(&[("a.rs", "fn a() { let x = 1; }"), ("b.rs", "fn b() {}")]);
        detector.detect("p", &before).await.unwrap();
        detector
            .commit(
                "p",
                &hashes_for(&[("a.rs", "fn a() { let x = 1; }"), ("b.rs", "fn b() {}")]),
            )
            .await
            .unwrap();

        // Rename a local variable in one file only
        let after = files(&[("a.rs", "fn a() { let y = 1; }"), ("b.rs", "fn b() {}")]);
        let changes = detector.detect("p", &after).await.unwrap();
        assert_eq!(changes.modified, vec!["a.rs"]);
        assert_eq!(changes.added.len(), 0);
        assert_eq!(changes.unchanged, 1);
    }

    #[tokio::test]
    async fn missing_file_is_reported_deleted() {
        let detector = ChangeDetector::new(Arc::new(MemoryHashStore::new()));
        let before = files(&[("a.rs", "fn a() {}"), ("b.rs", "fn b() {}")]);
        detector.detect("p", &before).await.unwrap();
        detector
            .commit("p", &hashes_for(&[("a.rs", "fn a() {}"), ("b.rs", "fn b() {}")]))
            .await
            .unwrap();

        let after = files(&[("a.rs", "fn a() {}")]);
        let changes = detector.detect("p", &after).await.unwrap();
        assert_eq!(changes.deleted, vec!["b.rs"]);
        assert_eq!(changes.unchanged, 1);
    }

    #[tokio::test]
    async fn uncommitted_run_reclassifies_as_still_changed() {
        // A crash between detect and commit must lead to at-least-once
        // reprocessing, never a silently missed file.
        let detector = ChangeDetector::new(Arc::new(MemoryHashStore::new()));
        let scan = files(&[("a.rs", "fn a() {}")]);

        let first = detector.detect("p", &scan).await.unwrap();
        assert_eq!(first.added, vec!["a.rs"]);
        // no commit

        let second = detector.detect("p", &scan).await.unwrap();
        assert_eq!(second.added, vec!["a.rs"]);
    }

    #[tokio::test]
    async fn store_outage_degrades_to_full_rescan() {
        let detector = ChangeDetector::new(Arc::new(DownStore));
        let scan = files(&[("a.rs", "fn a() {}"), ("b.rs", "fn b() {}")]);

        let changes = detector.detect("p", &scan).await.unwrap();
        assert!(changes.full_rescan);
        assert_eq!(changes.modified, vec!["a.rs", "b.rs"]);
        assert_eq!(changes.added.len(), 0);
        assert_eq!(changes.unchanged, 0);
    }

    #[test]
    fn fingerprint_is_content_addressed() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        // byte-sensitive on purpose: whitespace matters at the file level
        assert_ne!(fingerprint("fn a() {}"), fingerprint("fn a()  {}"));
    }
}
