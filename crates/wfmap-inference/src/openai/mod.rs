//! OpenAI-compatible chat completion backend.
//!
//! Works with any endpoint that speaks the `/chat/completions` protocol
//! (OpenAI, OpenRouter, vLLM, Ollama in compatibility mode, ...). Useful
//! for comparing oracle quality against the default Gemini backend.

mod backend;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use types::*;
