//! Core traits for wfmap abstractions.
//!
//! These traits define the seams between the pipeline and its external
//! collaborators, enabling pluggable backends and testability.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::models::{OutcomeMap, Subject, SubjectBatch};

// =============================================================================
// SOURCE TRAITS
// =============================================================================

/// Produces the subjects to classify.
///
/// Delivery is at-least-once: the same subject id may be yielded more than
/// once and consumers deduplicate by id. An `Err` item is fatal for the run.
pub trait SubjectSource: Send + Sync {
    /// Lazily stream every subject in the source.
    fn subjects(&self) -> BoxStream<'_, Result<Subject>>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Classifies a batch of subjects against the candidate catalog.
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    /// Classify every subject in `batch`.
    ///
    /// Transport failures are returned as `Err` and abort the run. A
    /// response that cannot be interpreted yields an empty map; those
    /// subjects stay unmapped and are picked up again by the next run.
    async fn classify(&self, batch: &SubjectBatch) -> Result<OutcomeMap>;
}
