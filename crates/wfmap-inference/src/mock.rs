//! Mock generation backend for deterministic testing.
//!
//! Records every prompt it receives and answers with canned text, so
//! pipeline and classifier tests can assert on what was sent and how many
//! oracle calls were made.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wfmap_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .with_fixed_response(r#"{"1": {"id": "abbr", "confidence": 90}}"#);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use wfmap_core::{Error, GenerationBackend, Result};

/// A recorded generation call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    queued: VecDeque<Result<String>>,
}

/// Mock generation backend.
#[derive(Clone)]
pub struct MockGenerationBackend {
    default_response: String,
    responder: Option<Arc<dyn Fn(&str) -> String + Send + Sync>>,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationBackend {
    /// Create a mock that answers `{}` to everything.
    pub fn new() -> Self {
        Self {
            default_response: "{}".to_string(),
            responder: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Answer every call with `response`.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Compute each answer from the prompt.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Queue a one-shot response, consumed before the default applies.
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock().queued.push_back(Ok(response.into()));
    }

    /// Queue a one-shot transport failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock()
            .queued
            .push_back(Err(Error::Inference(message.into())));
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Number of generation calls made so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let queued = {
            let mut state = self.lock();
            state.calls.push(MockCall {
                system: system.to_string(),
                prompt: prompt.to_string(),
            });
            state.queued.pop_front()
        };
        if let Some(response) = queued {
            return response;
        }
        Ok(match &self.responder {
            Some(responder) => responder(prompt),
            None => self.default_response.clone(),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
