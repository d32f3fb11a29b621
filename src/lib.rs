//! SynthData Core - synthetic function-calling dataset generation
//!
//! This library prompts an LLM with few-shot examples to produce plain-English
//! query / function-call pairs for a catalog of utility tools, then repairs,
//! parses, deduplicates and aggregates what comes back.

pub mod core;
pub mod error;
#[cfg(feature = "python")]
pub mod python;
pub mod synth;

// Re-export key types for internal use
pub use crate::core::config::{FailurePolicy, GeneratorConfig, ModelConfig};
pub use crate::core::tools::{ToolRegistry, ToolSpec};
pub use error::{GenerationError, SynthError, SynthResult, ToolError};
pub use synth::runner::run;
pub use synth::{
    aggregate, parse_batch, repair_and_parse, CompletionBackend, ExampleSet, OllamaBackend,
    ParsedExample, RunController, RunOptions,
};

/// Initialize tracing for the library.
pub fn setup_logging(level: Option<String>) {
    let filter = level.unwrap_or_else(|| "info".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
