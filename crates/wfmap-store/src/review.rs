//! Human-in-the-loop review queue.
//!
//! The queue is materialized once from the mapping store, filtered and
//! sorted, and persisted. From then on the persisted queue is the source of
//! truth: it is reloaded on restart and rewritten in full after every
//! decision.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use wfmap_core::{CandidateSet, Error, Outcome, OutcomeMap, Result, ReviewCounts, ReviewItem, ReviewStatus};

use crate::catalog::ChromestatusCatalog;
use crate::storage::FilesystemBackend;

/// Ordered list of review items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewQueue {
    items: Vec<ReviewItem>,
}

impl ReviewQueue {
    pub fn new(items: Vec<ReviewItem>) -> Self {
        Self { items }
    }

    /// Build a fresh queue from classification outcomes.
    ///
    /// Filter chain, in order:
    /// 1. failures are dropped;
    /// 2. subjects missing from the chromestatus snapshot are dropped;
    /// 3. subjects already mapped to a valid candidate are dropped;
    /// 4. outcomes proposing an unknown candidate are dropped.
    ///
    /// The rest is sorted by the subject's last modification, most recent
    /// first; entries without a readable timestamp go last.
    pub fn build(
        mapping: &OutcomeMap,
        chromestatus: &ChromestatusCatalog,
        candidates: &CandidateSet,
    ) -> Self {
        let mut items = Vec::new();
        let mut dropped = 0usize;

        for (subject_id, outcome) in mapping {
            let (target_id, confidence, notes) = match outcome {
                Outcome::Success {
                    target_id,
                    confidence,
                    notes,
                } => (target_id, *confidence, notes),
                Outcome::Failure { .. } => continue,
            };

            if !chromestatus.contains(subject_id) {
                dropped += 1;
                continue;
            }
            if chromestatus
                .web_feature(subject_id)
                .is_some_and(|existing| candidates.contains(existing))
            {
                dropped += 1;
                continue;
            }
            if !candidates.contains(target_id) {
                debug!(subject_id = %subject_id, target_id = %target_id, "Dropping proposal with unknown target");
                dropped += 1;
                continue;
            }

            items.push(ReviewItem::pending(
                subject_id.clone(),
                target_id.clone(),
                confidence,
                notes.clone(),
            ));
        }

        items.sort_by_key(|item| {
            let updated = chromestatus.updated_at(&item.subject_id);
            (updated.is_none(), Reverse(updated))
        });

        info!(
            subsystem = "store",
            component = "review",
            op = "build",
            item_count = items.len(),
            dropped,
            "Built review queue"
        );
        Self { items }
    }

    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Record a decision for the proposal `subject_id → target_id`.
    ///
    /// Any status may follow any other. Returns `Error::NotFound` when the
    /// queue holds no such proposal, leaving the queue untouched.
    pub fn decide(
        &mut self,
        subject_id: &str,
        target_id: &str,
        status: ReviewStatus,
    ) -> Result<&ReviewItem> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.matches(subject_id, target_id))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Item not found in review queue: {} -> {}",
                    subject_id, target_id
                ))
            })?;
        item.review_status = status;
        Ok(item)
    }

    /// Items the reviewer accepted, in queue order.
    pub fn accepted(&self) -> impl Iterator<Item = &ReviewItem> {
        self.items
            .iter()
            .filter(|item| item.review_status == ReviewStatus::Accept)
    }

    pub fn counts(&self) -> ReviewCounts {
        let mut counts = ReviewCounts::default();
        for item in &self.items {
            match item.review_status {
                ReviewStatus::Pending => counts.pending += 1,
                ReviewStatus::Accept => counts.accept += 1,
                ReviewStatus::Reject => counts.reject += 1,
            }
        }
        counts
    }
}

/// Persistence for the review queue.
#[derive(Debug, Clone)]
pub struct ReviewStore {
    backend: FilesystemBackend,
    name: String,
}

impl ReviewStore {
    pub fn new(backend: FilesystemBackend, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    /// Load the persisted queue, if one exists.
    pub async fn load(&self) -> Result<Option<ReviewQueue>> {
        self.backend.read_json(&self.name).await
    }

    /// Rewrite the whole queue file.
    pub async fn save(&self, queue: &ReviewQueue) -> Result<()> {
        self.backend.write_json(&self.name, queue).await
    }

    /// Reuse the persisted queue, or build one from the mapping store and
    /// persist it so later runs review the same items.
    pub async fn load_or_build(
        &self,
        mapping: &OutcomeMap,
        chromestatus: &ChromestatusCatalog,
        candidates: &CandidateSet,
    ) -> Result<ReviewQueue> {
        if let Some(queue) = self.load().await? {
            info!(
                subsystem = "store",
                component = "review",
                op = "load",
                path = %self.backend.full_path(&self.name).display(),
                item_count = queue.len(),
                "Using existing review queue"
            );
            return Ok(queue);
        }
        let queue = ReviewQueue::build(mapping, chromestatus, candidates);
        self.save(&queue).await?;
        Ok(queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wfmap_core::Candidate;

    fn candidates() -> CandidateSet {
        ["abbr", "aborting", "anchor-positioning"]
            .into_iter()
            .map(|id| (id.to_string(), Candidate::default()))
            .collect()
    }

    fn chromestatus() -> ChromestatusCatalog {
        ChromestatusCatalog::from_entries(vec![
            json!({"id": 1, "web_feature": "", "updated": {"when": "2024-01-01 00:00:00"}}),
            json!({"id": 2, "web_feature": "abbr", "updated": {"when": "2024-02-01 00:00:00"}}),
            json!({"id": 3, "web_feature": "gone-feature", "updated": {"when": "2024-03-01 00:00:00"}}),
            json!({"id": 4, "updated": {"when": "2024-04-01 00:00:00"}}),
            json!({"id": 5}),
            json!({"id": 6, "updated": {"when": "2023-12-01 00:00:00"}}),
        ])
    }

    fn mapping() -> OutcomeMap {
        let mut m = OutcomeMap::new();
        m.insert("1".into(), Outcome::success("aborting", 90, "signal"));
        // already mapped to a valid feature
        m.insert("2".into(), Outcome::success("abbr", 80, ""));
        // existing mapping is stale, so this one is reviewed
        m.insert("3".into(), Outcome::success("anchor-positioning", 70, ""));
        m.insert("4".into(), Outcome::failure("no match"));
        m.insert("5".into(), Outcome::success("abbr", 40, "no timestamp"));
        // unknown target
        m.insert("6".into(), Outcome::success("made-up", 60, ""));
        // not in the snapshot
        m.insert("99".into(), Outcome::success("abbr", 100, ""));
        m
    }

    #[test]
    fn test_build_filters_and_sorts() {
        let queue = ReviewQueue::build(&mapping(), &chromestatus(), &candidates());
        let ids: Vec<&str> = queue.items().iter().map(|i| i.subject_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "5"]);
        assert!(queue
            .items()
            .iter()
            .all(|i| i.review_status == ReviewStatus::Pending));
        assert_eq!(queue.items()[1].notes, "signal");
        assert_eq!(queue.items()[1].confidence, 90);
    }

    #[test]
    fn test_decide_transitions_freely() {
        let mut queue = ReviewQueue::build(&mapping(), &chromestatus(), &candidates());

        queue.decide("1", "aborting", ReviewStatus::Accept).unwrap();
        assert_eq!(queue.accepted().count(), 1);

        queue.decide("1", "aborting", ReviewStatus::Reject).unwrap();
        assert_eq!(queue.accepted().count(), 0);

        let item = queue.decide("1", "aborting", ReviewStatus::Pending).unwrap();
        assert_eq!(item.review_status, ReviewStatus::Pending);
    }

    #[test]
    fn test_decide_unknown_item_leaves_queue_untouched() {
        let mut queue = ReviewQueue::build(&mapping(), &chromestatus(), &candidates());
        let before = queue.clone();

        let result = queue.decide("1", "abbr", ReviewStatus::Accept);
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(queue, before);
    }

    #[test]
    fn test_counts() {
        let mut queue = ReviewQueue::build(&mapping(), &chromestatus(), &candidates());
        queue.decide("1", "aborting", ReviewStatus::Accept).unwrap();
        queue.decide("3", "anchor-positioning", ReviewStatus::Reject).unwrap();
        let counts = queue.counts();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.accept, 1);
        assert_eq!(counts.reject, 1);
        assert_eq!(counts.total(), queue.len());
    }

    #[tokio::test]
    async fn test_load_or_build_persists_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::new(FilesystemBackend::new(dir.path()), "mapping-review.json");

        let mut queue = store
            .load_or_build(&mapping(), &chromestatus(), &candidates())
            .await
            .unwrap();
        assert_eq!(queue.len(), 3);
        assert!(dir.path().join("mapping-review.json").exists());

        queue.decide("5", "abbr", ReviewStatus::Accept).unwrap();
        store.save(&queue).await.unwrap();

        // A different mapping must not rebuild the persisted queue.
        let reloaded = store
            .load_or_build(&OutcomeMap::new(), &chromestatus(), &candidates())
            .await
            .unwrap();
        assert_eq!(reloaded, queue);
    }

    #[tokio::test]
    async fn test_persisted_form_uses_item_fields() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let store = ReviewStore::new(backend.clone(), "q.json");
        store
            .save(&ReviewQueue::new(vec![ReviewItem::pending("1", "abbr", 70, "n")]))
            .await
            .unwrap();

        let value: serde_json::Value = backend.read_json("q.json").await.unwrap().unwrap();
        assert_eq!(
            value,
            json!([{
                "subject_id": "1",
                "target_id": "abbr",
                "confidence": 70,
                "notes": "n",
                "review_status": "pending"
            }])
        );
    }
}
