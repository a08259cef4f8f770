//! # wfmap-inference
//!
//! Classification oracle client for wfmap.
//!
//! This crate provides:
//! - The fixed system prompt and per-batch prompt builder
//! - Gemini backend (default, feature `gemini`)
//! - OpenAI-compatible backend (optional, feature `openai`)
//! - Tolerant parsing of free-form model output into outcomes
//! - [`Classifier`], the [`ClassificationOracle`] the pipeline talks to
//!
//! # Feature Flags
//!
//! - `gemini` (default): Enable Gemini backend
//! - `openai`: Enable OpenAI-compatible backend
//! - `mock`: Expose `MockGenerationBackend` to downstream tests
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wfmap_inference::{Classifier, GeminiBackend};
//!
//! let backend = Arc::new(GeminiBackend::from_env()?);
//! let oracle = Classifier::new(backend, Arc::new(candidates));
//! let outcomes = oracle.classify(&batch).await?;
//! ```

pub mod classifier;
pub mod prompt;
pub mod provider;
pub mod response;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use wfmap_core::*;

pub use classifier::Classifier;
pub use prompt::{classification_prompt, SYSTEM_PROMPT};
pub use provider::{backend_from_env, OracleProvider};
pub use response::{extract_json_object, parse_outcomes};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiBackend, GeminiConfig};

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};
