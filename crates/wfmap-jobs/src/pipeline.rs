//! Resumable classification run.
//!
//! Subjects are streamed from the source one at a time. Anything already
//! in the mapping store is skipped, so re-running after a crash (or after
//! a full run) only pays for what is still missing. Each full batch is
//! classified and merged into the store before the next subject is pulled;
//! the final partial batch is always flushed.
//!
//! Errors from the source, the oracle transport, or the store abort the
//! run. Batches merged before the error stay on disk.

use std::collections::HashSet;
use std::time::Instant;

use futures::TryStreamExt;
use serde::Serialize;
use tracing::{debug, info};

use wfmap_core::defaults::CLASSIFY_BATCH_SIZE;
use wfmap_core::{ClassificationOracle, Result, SubjectBatch, SubjectSource};
use wfmap_store::MappingStore;

use crate::batcher::Batcher;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum subjects per oracle request.
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: CLASSIFY_BATCH_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CLASSIFY_BATCH_SIZE` | `250` | Subjects per oracle request |
    pub fn from_env() -> Self {
        let batch_size = std::env::var("CLASSIFY_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(CLASSIFY_BATCH_SIZE)
            .max(1);
        Self { batch_size }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Subjects read from the source.
    pub seen: usize,
    /// Skipped because the mapping store already had them.
    pub already_mapped: usize,
    /// Skipped because they were already submitted earlier in this run.
    pub duplicates: usize,
    /// Subjects sent to the oracle.
    pub submitted: usize,
    /// Oracle requests made.
    pub batches: usize,
    /// Outcomes merged into the store.
    pub merged: usize,
    /// Merged outcomes that propose a candidate.
    pub successes: usize,
}

/// Drives a source through the oracle into the mapping store.
#[derive(Debug, Clone, Default)]
pub struct ClassificationPipeline {
    config: PipelineConfig,
}

impl ClassificationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify every subject of `source` that `store` does not have yet.
    pub async fn run<S, O>(
        &self,
        source: &S,
        oracle: &O,
        store: &mut MappingStore,
    ) -> Result<RunReport>
    where
        S: SubjectSource + ?Sized,
        O: ClassificationOracle + ?Sized,
    {
        let start = Instant::now();
        let mut report = RunReport::default();
        let mut batcher = Batcher::new(self.config.batch_size);
        let mut submitted: HashSet<String> = HashSet::new();

        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "run",
            batch_size = batcher.max_size(),
            already_mapped = store.len(),
            "Starting classification run"
        );

        let mut subjects = source.subjects();
        while let Some(subject) = subjects.try_next().await? {
            report.seen += 1;
            if store.contains(&subject.id) {
                report.already_mapped += 1;
                continue;
            }
            if !submitted.insert(subject.id.clone()) {
                debug!(subject_id = %subject.id, "Subject already submitted in this run");
                report.duplicates += 1;
                continue;
            }
            if let Some(batch) = batcher.push(subject) {
                self.process(batch, oracle, store, &mut report).await?;
            }
        }
        if let Some(batch) = batcher.finish() {
            self.process(batch, oracle, store, &mut report).await?;
        }

        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "run",
            seen = report.seen,
            already_mapped = report.already_mapped,
            duplicates = report.duplicates,
            submitted = report.submitted,
            batches = report.batches,
            merged = report.merged,
            successes = report.successes,
            total = store.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Classification run complete"
        );
        Ok(report)
    }

    async fn process<O>(
        &self,
        batch: SubjectBatch,
        oracle: &O,
        store: &mut MappingStore,
        report: &mut RunReport,
    ) -> Result<()>
    where
        O: ClassificationOracle + ?Sized,
    {
        report.batches += 1;
        report.submitted += batch.len();

        let outcomes = oracle.classify(&batch).await?;
        report.successes += outcomes.values().filter(|o| o.is_success()).count();
        let merged = store.merge(outcomes).await?;
        report.merged += merged;

        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "merge",
            batch = report.batches,
            batch_size = batch.len(),
            merged,
            total = store.len(),
            "Got {} results, saved",
            merged
        );
        Ok(())
    }
}
