//! Configuration, tool catalog and prompt hints

pub mod config;
pub mod hints;
pub mod tools;

pub use config::{FailurePolicy, GeneratorConfig, ModelConfig};
pub use hints::{HintBook, Hints};
pub use tools::{ParamKind, ToolParameter, ToolRegistry, ToolSpec};
