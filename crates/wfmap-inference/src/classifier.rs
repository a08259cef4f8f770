//! The classification oracle: prompt, generate, parse.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use wfmap_core::{
    CandidateSet, ClassificationOracle, GenerationBackend, OutcomeMap, Result, SubjectBatch,
};

use crate::prompt::{classification_prompt, SYSTEM_PROMPT};
use crate::response::{extract_json_object, parse_outcomes};

/// Classifies batches with a generation backend against a fixed
/// candidate set.
#[derive(Clone)]
pub struct Classifier {
    backend: Arc<dyn GenerationBackend>,
    candidates: Arc<CandidateSet>,
}

impl Classifier {
    pub fn new(backend: Arc<dyn GenerationBackend>, candidates: Arc<CandidateSet>) -> Self {
        Self {
            backend,
            candidates,
        }
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}

#[async_trait]
impl ClassificationOracle for Classifier {
    async fn classify(&self, batch: &SubjectBatch) -> Result<OutcomeMap> {
        if batch.is_empty() {
            return Ok(OutcomeMap::new());
        }
        let start = Instant::now();
        let prompt = classification_prompt(&self.candidates, batch)?;

        info!(
            subsystem = "inference",
            component = "classifier",
            op = "classify",
            batch_size = batch.len(),
            model = %self.backend.model_name(),
            "Processing {} entries",
            batch.len()
        );

        let text = self.backend.generate_with_system(SYSTEM_PROMPT, &prompt).await?;

        let Some(response) = extract_json_object(&text) else {
            warn!(
                subsystem = "inference",
                component = "classifier",
                batch_size = batch.len(),
                response_len = text.len(),
                "No JSON object found in model response"
            );
            return Ok(OutcomeMap::new());
        };

        let answered = response.len();
        let outcomes = parse_outcomes(response, batch, &self.candidates);
        let successes = outcomes.values().filter(|o| o.is_success()).count();

        info!(
            subsystem = "inference",
            component = "classifier",
            op = "classify",
            batch_size = batch.len(),
            answered,
            result_count = outcomes.len(),
            success_count = successes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Got {} results",
            outcomes.len()
        );
        if outcomes.len() < batch.len() {
            warn!(
                missing = batch.len() - outcomes.len(),
                "Some subjects got no usable answer and stay unmapped"
            );
        }
        Ok(outcomes)
    }
}
