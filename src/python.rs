//! Python bindings (`--features python`) for the Gradio front-end

use crate::core::config::{GeneratorConfig, ModelConfig};
use crate::synth::repair;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

/// Initialize tracing for the library.
#[pyfunction]
#[pyo3(name = "setup_logging", signature = (level = None))]
fn py_setup_logging(level: Option<String>) {
    crate::setup_logging(level);
}

/// Parse (and if needed repair) one record; returns its JSON or `None`.
#[pyfunction]
#[pyo3(name = "repair_and_parse")]
fn py_repair_and_parse(text: &str) -> PyResult<Option<String>> {
    repair::repair_and_parse(text)
        .map(|example| serde_json::to_string(&example))
        .transpose()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Run the generator against Ollama and return the example set as JSON.
#[pyfunction]
#[pyo3(signature = (model, temperature, functions, randomize = false, num_examples = 1, runs = 1))]
fn generate(
    py: Python<'_>,
    model: String,
    temperature: f32,
    functions: Vec<String>,
    randomize: bool,
    num_examples: usize,
    runs: usize,
) -> PyResult<String> {
    let defaults = GeneratorConfig::from_env().map_err(|e| PyValueError::new_err(e.to_string()))?;
    let config = GeneratorConfig {
        model: ModelConfig {
            model,
            temperature,
            ..defaults.model
        },
        functions,
        randomize,
        num_examples,
        runs,
        ..defaults
    };

    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

    // Release the GIL while blocked on model calls
    let set = py
        .allow_threads(|| runtime.block_on(crate::synth::runner::run(&config)))
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

    set.to_json_pretty()
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

/// Python module initialization
#[pymodule]
fn synthdata_core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_setup_logging, m)?)?;
    m.add_function(wrap_pyfunction!(py_repair_and_parse, m)?)?;
    m.add_function(wrap_pyfunction!(generate, m)?)?;
    Ok(())
}
