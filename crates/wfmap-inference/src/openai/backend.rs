use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use wfmap_core::defaults::{OPENAI_GEN_MODEL, OPENAI_URL, ORACLE_TIMEOUT_SECS};
use wfmap_core::{Error, GenerationBackend, Result};

use super::types::*;

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL, up to and including the API version.
    pub base_url: String,
    /// Bearer token. Local servers usually need none.
    pub api_key: Option<String>,
    pub gen_model: String,
    pub timeout_seconds: u64,
    /// Ask the server for a bare JSON object answer.
    pub json_mode: bool,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_URL.to_string(),
            api_key: None,
            gen_model: OPENAI_GEN_MODEL.to_string(),
            timeout_seconds: ORACLE_TIMEOUT_SECS,
            json_mode: true,
        }
    }
}

impl OpenAIConfig {
    /// Read `OPENAI_BASE_URL`, `OPENAI_API_KEY`, `OPENAI_GEN_MODEL`,
    /// `OPENAI_TIMEOUT` and `OPENAI_JSON_MODE`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            api_key: var("OPENAI_API_KEY"),
            gen_model: var("OPENAI_GEN_MODEL").unwrap_or(defaults.gen_model),
            timeout_seconds: var("OPENAI_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
            json_mode: var("OPENAI_JSON_MODE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
                .unwrap_or(defaults.json_mode),
        }
    }
}

/// Generation over `POST {base}/chat/completions`.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            model = %config.gen_model,
            json_mode = config.json_mode,
            "Initializing OpenAI-compatible backend"
        );
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn chat_request(&self, system: &str, prompt: &str) -> ChatCompletionRequest {
        let system = (!system.is_empty()).then(|| ChatMessage::new("system", system));
        ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: system
                .into_iter()
                .chain([ChatMessage::new("user", prompt)])
                .collect(),
            response_format: self.config.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let mut request = self
            .client
            .post(self.endpoint())
            .json(&self.chat_request(system, prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<OpenAIErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(Error::Inference(format!(
                "Chat completion returned {}: {}",
                status, message
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Malformed chat completion: {}", e)))?;

        let Some(choice) = completion.choices.into_iter().next() else {
            warn!(model = %self.config.gen_model, "Chat completion had no choices");
            return Ok(String::new());
        };
        if choice.finish_reason.as_deref() == Some("length") {
            warn!(model = %self.config.gen_model, "Generation truncated at the token limit");
        }

        debug!(
            model = %self.config.gen_model,
            response_len = choice.message.content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(choice.message.content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}
