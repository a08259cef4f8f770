//! Size-bounded batching of subjects.

use wfmap_core::{Subject, SubjectBatch};

/// Accumulates subjects into batches of at most `max_size`.
///
/// A subject pushed twice while still pending replaces the earlier copy,
/// so a batch never holds the same id twice.
#[derive(Debug)]
pub struct Batcher {
    max_size: usize,
    pending: SubjectBatch,
}

impl Batcher {
    /// Create a batcher. A `max_size` of zero is treated as one.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            pending: SubjectBatch::new(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of subjects waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Add a subject; returns the batch once it is full.
    pub fn push(&mut self, subject: Subject) -> Option<SubjectBatch> {
        self.pending.insert(subject);
        if self.pending.len() >= self.max_size {
            Some(self.pending.take())
        } else {
            None
        }
    }

    /// Flush whatever is left, if anything.
    pub fn finish(&mut self) -> Option<SubjectBatch> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.take())
        }
    }
}
