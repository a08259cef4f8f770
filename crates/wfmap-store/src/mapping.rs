//! Resumable subject → outcome mapping store.
//!
//! The store is the pipeline's only durable state. It is loaded once per
//! run (empty on first run), consulted to skip subjects that were already
//! classified, and rewritten in full after every merged batch so a crash
//! loses at most the batch in flight. Single writer, no locking.

use std::time::Instant;

use tracing::{debug, info};

use wfmap_core::{Outcome, OutcomeMap, Result};

use crate::storage::FilesystemBackend;

/// Persisted mapping from subject id to [`Outcome`].
#[derive(Debug)]
pub struct MappingStore {
    backend: FilesystemBackend,
    name: String,
    entries: OutcomeMap,
}

impl MappingStore {
    /// Load the store from `name` inside the backend's data directory.
    ///
    /// A missing file yields an empty store; a malformed one is an error.
    pub async fn load(backend: FilesystemBackend, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let entries: OutcomeMap = backend.read_json(&name).await?.unwrap_or_default();
        info!(
            subsystem = "store",
            component = "mapping",
            op = "load",
            path = %backend.full_path(&name).display(),
            entry_count = entries.len(),
            "Loaded mapping store"
        );
        Ok(Self {
            backend,
            name,
            entries,
        })
    }

    pub fn contains(&self, subject_id: &str) -> bool {
        self.entries.contains_key(subject_id)
    }

    pub fn get(&self, subject_id: &str) -> Option<&Outcome> {
        self.entries.get(subject_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &OutcomeMap {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(id, outcome)| (id.as_str(), outcome))
    }

    /// Number of successful outcomes.
    pub fn success_count(&self) -> usize {
        self.entries.values().filter(|o| o.is_success()).count()
    }

    /// Merge `outcomes` (new keys added, existing keys overwritten) and
    /// rewrite the whole file. An empty merge changes nothing and skips
    /// the write.
    pub async fn merge(&mut self, outcomes: OutcomeMap) -> Result<usize> {
        if outcomes.is_empty() {
            return Ok(0);
        }
        let start = Instant::now();
        let merged = outcomes.len();
        self.entries.extend(outcomes);
        self.backend.write_json(&self.name, &self.entries).await?;

        debug!(
            subsystem = "store",
            component = "mapping",
            op = "merge",
            merged,
            total = self.entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Mapping store saved"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::load(FilesystemBackend::new(dir.path()), "mapping.json")
            .await
            .unwrap();
        assert!(store.is_empty());
        assert!(!dir.path().join("mapping.json").exists());
    }

    #[tokio::test]
    async fn test_merge_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let mut store = MappingStore::load(backend.clone(), "mapping.json")
            .await
            .unwrap();

        let mut outcomes = OutcomeMap::new();
        outcomes.insert("1".into(), Outcome::success("abbr", 80, "element"));
        outcomes.insert("2".into(), Outcome::failure("no match"));
        assert_eq!(store.merge(outcomes).await.unwrap(), 2);

        let reloaded = MappingStore::load(backend, "mapping.json").await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("1"), Some(&Outcome::success("abbr", 80, "element")));
        assert_eq!(reloaded.success_count(), 1);
    }

    #[tokio::test]
    async fn test_merge_overwrites_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let mut store = MappingStore::load(backend.clone(), "mapping.json")
            .await
            .unwrap();

        let mut first = OutcomeMap::new();
        first.insert("1".into(), Outcome::failure("unsure"));
        store.merge(first).await.unwrap();

        let mut second = OutcomeMap::new();
        second.insert("1".into(), Outcome::success("aborting", 90, ""));
        second.insert("3".into(), Outcome::success("abbr", 50, ""));
        store.merge(second).await.unwrap();

        let reloaded = MappingStore::load(backend, "mapping.json").await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("1").and_then(Outcome::target_id), Some("aborting"));
    }

    #[tokio::test]
    async fn test_file_is_sorted_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let mut store = MappingStore::load(backend.clone(), "mapping.json")
            .await
            .unwrap();

        let mut outcomes = OutcomeMap::new();
        outcomes.insert("20".into(), Outcome::failure("b"));
        outcomes.insert("10".into(), Outcome::failure("a"));
        store.merge(outcomes).await.unwrap();

        let value: serde_json::Value = backend.read_json("mapping.json").await.unwrap().unwrap();
        assert_eq!(value, json!({"10": {"failure": "a"}, "20": {"failure": "b"}}));
        let text = std::fs::read_to_string(dir.path().join("mapping.json")).unwrap();
        assert!(text.find("\"10\"").unwrap() < text.find("\"20\"").unwrap());
    }

    #[tokio::test]
    async fn test_empty_merge_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MappingStore::load(FilesystemBackend::new(dir.path()), "mapping.json")
            .await
            .unwrap();
        assert_eq!(store.merge(OutcomeMap::new()).await.unwrap(), 0);
        assert!(!dir.path().join("mapping.json").exists());
    }

    #[tokio::test]
    async fn test_malformed_store_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mapping.json"), b"[1, 2, 3]").unwrap();
        let result = MappingStore::load(FilesystemBackend::new(dir.path()), "mapping.json").await;
        assert!(result.is_err());
    }
}
