//! Completion backends
//!
//! The run controller only sees `CompletionBackend`; the Ollama client is the
//! production implementation.

use super::prompt::FewShotTemplate;
use crate::core::config::ModelConfig;
use crate::error::{GenerationError, GenerationResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Few-shot text completion service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Render `template` with the hints and return `runs` independent completions.
    async fn complete(
        &self,
        template: &FewShotTemplate,
        subject: &str,
        extra: &str,
        runs: usize,
    ) -> GenerationResult<Vec<String>>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for a local or remote Ollama server (`/api/generate`)
pub struct OllamaBackend {
    client: Client,
    config: ModelConfig,
}

impl OllamaBackend {
    pub fn new(config: ModelConfig) -> GenerationResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .gzip(true)
            .brotli(true)
            .build()?;
        info!(
            "🦙 [Ollama] Backend ready: model={} url={}",
            config.model, config.base_url
        );
        Ok(OllamaBackend { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    async fn generate_once(&self, prompt: &str) -> GenerationResult<String> {
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        let resp = self.client.post(self.endpoint()).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let error = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: error.chars().take(200).collect(),
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        if parsed.response.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(parsed.response)
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        template: &FewShotTemplate,
        subject: &str,
        extra: &str,
        runs: usize,
    ) -> GenerationResult<Vec<String>> {
        let prompt = template.render(subject, extra);
        debug!("[Ollama] Prompt ({} chars)", prompt.len());

        let mut outputs = Vec::with_capacity(runs);
        for _ in 0..runs {
            outputs.push(self.generate_once(&prompt).await?);
        }
        Ok(outputs)
    }
}
