use crate::error::{SynthError, SynthResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// What the run controller does when a completion call fails or times out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Skip the (function, run) pair and count `num_examples` records as failed
    Skip,
    /// Abort the whole generation and surface the error
    Abort,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Skip
    }
}

/// Model / backend configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl ModelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            model: "llama3.1:latest".to_string(),
            temperature: 0.5,
            base_url: "http://localhost:11434".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Main parameters for a generation job
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub model: ModelConfig,
    pub functions: Vec<String>,
    pub randomize: bool,
    pub num_examples: usize,
    pub runs: usize,
    pub max_concurrency: usize,
    pub on_failure: FailurePolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            model: ModelConfig::default(),
            functions: Vec::new(),
            randomize: false,
            num_examples: 1,
            runs: 1,
            max_concurrency: 1,
            on_failure: FailurePolicy::Skip,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overlaid with `SYNTH_*` / `OLLAMA_BASE_URL` environment variables.
    pub fn from_env() -> SynthResult<Self> {
        let mut config = Self::default();

        if let Ok(model) = env::var("SYNTH_MODEL") {
            config.model.model = model;
        }
        if let Ok(url) = env::var("OLLAMA_BASE_URL") {
            config.model.base_url = url;
        }
        if let Ok(raw) = env::var("SYNTH_TEMPERATURE") {
            config.model.temperature = raw
                .parse()
                .map_err(|_| SynthError::Config(format!("SYNTH_TEMPERATURE='{}'", raw)))?;
        }
        if let Ok(raw) = env::var("SYNTH_TIMEOUT_SECS") {
            config.model.request_timeout_secs = raw
                .parse()
                .map_err(|_| SynthError::Config(format!("SYNTH_TIMEOUT_SECS='{}'", raw)))?;
        }
        if let Ok(raw) = env::var("SYNTH_MAX_CONCURRENCY") {
            config.max_concurrency = raw
                .parse()
                .map_err(|_| SynthError::Config(format!("SYNTH_MAX_CONCURRENCY='{}'", raw)))?;
        }

        Ok(config)
    }

    pub fn with_functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions = functions.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> SynthResult<()> {
        if self.functions.is_empty() {
            return Err(SynthError::Config("no functions selected".to_string()));
        }
        if self.runs == 0 {
            return Err(SynthError::Config("runs must be at least 1".to_string()));
        }
        if self.num_examples == 0 {
            return Err(SynthError::Config("num_examples must be at least 1".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(SynthError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(SynthError::Config(format!(
                "temperature {} outside [0, 2]",
                self.model.temperature
            )));
        }
        Ok(())
    }
}
