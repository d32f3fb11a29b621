//! Synthetic example pipeline
//!
//! Raw model output flows through these stages:
//! 1. `parser` splits it into blank-line-delimited candidate records
//! 2. `repair` parses each candidate, attempting a bounded quote repair on failure
//! 3. `aggregate` dedupes accepted records across runs and optionally shuffles
//!
//! `runner` drives the loop over (run, function) pairs against a `backend`.

pub mod aggregate;
pub mod backend;
pub mod export;
pub mod parser;
pub mod prompt;
pub mod repair;
pub mod runner;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub use aggregate::{aggregate, canonical_key, Aggregator};
pub use backend::{CompletionBackend, OllamaBackend};
pub use parser::{parse_batch, Batch};
pub use prompt::FewShotTemplate;
pub use repair::repair_and_parse;
pub use runner::{RunController, RunOptions};

/// One (function, run) unit of work handed to the completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub function_name: String,
    pub subject_hint: String,
    pub extra_hint: String,
    pub num_examples: usize,
    pub run_index: usize,
}

/// The function call a query should resolve to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub function: String,
    #[serde(default, deserialize_with = "scalar_map")]
    pub arguments: BTreeMap<String, String>,
}

/// A plain-English query paired with its expected function call.
///
/// Keys other than `query` / `answer.function` / `answer.arguments` (for
/// instance a model-invented `result`) are dropped on parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedExample {
    pub query: String,
    pub answer: Answer,
}

impl ParsedExample {
    pub fn new<I, K, V>(query: &str, function: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ParsedExample {
            query: query.to_string(),
            answer: Answer {
                function: function.to_string(),
                arguments: arguments
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            },
        }
    }
}

/// Models often emit numbers and booleans where strings were asked for;
/// scalars are kept as their JSON text, nested values are rejected.
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k, s)),
            Value::Number(n) => Ok((k, n.to_string())),
            Value::Bool(b) => Ok((k, b.to_string())),
            other => Err(D::Error::custom(format!(
                "argument '{}' must be a scalar, got {}",
                k, other
            ))),
        })
        .collect()
}

/// Deduplicated examples plus the counters callers use to observe degradation.
///
/// `number_generated` counts accepted records *before* dedup, so it can exceed
/// `queries.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleSet {
    #[serde(rename = "number failed", default)]
    pub number_failed: usize,
    #[serde(rename = "number generated", default)]
    pub number_generated: usize,
    #[serde(default)]
    pub queries: Vec<ParsedExample>,
}

impl ExampleSet {
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_bool_arguments_become_strings() {
        let ex: ParsedExample = serde_json::from_str(
            r#"{"query":"q","answer":{"function":"calculate_area","arguments":{"length":1.5,"width":2,"round_result":true}}}"#,
        )
        .unwrap();
        assert_eq!(ex.answer.arguments["length"], "1.5");
        assert_eq!(ex.answer.arguments["width"], "2");
        assert_eq!(ex.answer.arguments["round_result"], "true");
    }

    #[test]
    fn nested_arguments_are_rejected() {
        let res = serde_json::from_str::<ParsedExample>(
            r#"{"query":"q","answer":{"function":"f","arguments":{"a":{"b":"c"}}}}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn extra_answer_keys_are_dropped() {
        let ex: ParsedExample = serde_json::from_str(
            r#"{"query":"capital of Spain?","answer":{"function":"get_capital","arguments":{"country":"Spain"},"result":{"capital":"Madrid"}}}"#,
        )
        .unwrap();
        assert_eq!(ex, ParsedExample::new("capital of Spain?", "get_capital", [("country", "Spain")]));
    }

    #[test]
    fn example_set_uses_spaced_counter_keys() {
        let set = ExampleSet {
            number_failed: 1,
            number_generated: 2,
            queries: vec![],
        };
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["number failed"], 1);
        assert_eq!(json["number generated"], 2);
        assert!(json["queries"].as_array().unwrap().is_empty());
    }
}
