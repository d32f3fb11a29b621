//! Tool Registry - typed catalog of the utility functions examples are generated for
//!
//! The pipeline never invokes these tools. It only needs each tool's name and
//! ordered, typed parameter list to build prompt hints and function declarations.

use crate::error::ToolError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Declared type of a tool parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Str,
    Float,
    Int,
    Bool,
    /// Date string in `YYYY-MM-DD` form
    Date,
    /// One of a fixed set of string values
    OneOf(Vec<String>),
}

impl ParamKind {
    fn describe(&self) -> String {
        match self {
            ParamKind::Str => "str".to_string(),
            ParamKind::Float => "float".to_string(),
            ParamKind::Int => "int".to_string(),
            ParamKind::Bool => "bool".to_string(),
            ParamKind::Date => "str in the format 'YYYY-MM-DD'".to_string(),
            ParamKind::OneOf(values) => values
                .iter()
                .map(|v| format!("'{}'", v))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn json_type(&self) -> &'static str {
        match self {
            ParamKind::Float => "number",
            ParamKind::Int => "integer",
            ParamKind::Bool => "boolean",
            ParamKind::Str | ParamKind::Date | ParamKind::OneOf(_) => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamKind,
}

impl ToolParameter {
    pub fn new(name: &str, kind: ParamKind) -> Self {
        ToolParameter {
            name: name.to_string(),
            kind,
        }
    }
}

/// Name plus fixed, ordered parameter list of one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, parameters: Vec<ToolParameter>) -> Self {
        ToolSpec {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    fn validate(&self) -> Result<(), ToolError> {
        if !is_identifier(&self.name) {
            return Err(ToolError::InvalidName(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !is_identifier(&param.name) {
                return Err(ToolError::InvalidParameter {
                    tool: self.name.clone(),
                    param: param.name.clone(),
                });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(ToolError::DuplicateParameter {
                    tool: self.name.clone(),
                    param: param.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// "it takes two arguments base: float, exponent: float"
    pub fn signature_phrase(&self) -> String {
        let count = self.parameters.len();
        let noun = if count == 1 { "argument" } else { "arguments" };
        let args = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind.describe()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("it takes {} {} {}", count_word(count), noun, args)
    }

    /// Function declaration in the JSON-schema shape LLM function-calling APIs expect
    pub fn definition(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut prop = serde_json::json!({ "type": param.kind.json_type() });
            if let ParamKind::OneOf(values) = &param.kind {
                prop["enum"] = serde_json::json!(values);
            }
            properties.insert(param.name.clone(), prop);
        }
        let required: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();

        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required
            }
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn count_word(n: usize) -> String {
    const WORDS: [&str; 10] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    ];
    WORDS
        .get(n)
        .map(|w| w.to_string())
        .unwrap_or_else(|| n.to_string())
}

/// Registry of tool specs, validated on insert
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, ToolSpec>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Registry pre-loaded with the standard utility catalog
    pub fn builtin() -> Self {
        let registry = Self::new();
        for spec in builtin_specs() {
            if let Err(e) = registry.register(spec) {
                tracing::error!("[ToolRegistry] builtin spec rejected: {}", e);
            }
        }
        registry
    }

    pub fn register(&self, spec: ToolSpec) -> Result<(), ToolError> {
        spec.validate()?;

        let mut map = self.tools.write();
        if map.contains_key(&spec.name) {
            return Err(ToolError::Duplicate(spec.name));
        }
        info!(
            "📚 [ToolRegistry] Registered {} ({} params)",
            spec.name,
            spec.parameters.len()
        );
        map.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<ToolSpec> {
        self.tools.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// Sorted tool names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    pub fn signature_phrase(&self, name: &str) -> Option<String> {
        self.tools.read().get(name).map(|t| t.signature_phrase())
    }

    /// Function declarations for every registered tool, sorted by name
    pub fn tool_definitions(&self) -> serde_json::Value {
        let map = self.tools.read();
        let mut specs: Vec<&ToolSpec> = map.values().collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        serde_json::json!({
            "function_declarations": specs.iter().map(|s| s.definition()).collect::<Vec<_>>()
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_specs() -> Vec<ToolSpec> {
    use ParamKind::*;
    let p = ToolParameter::new;

    vec![
        ToolSpec::new(
            "calculate_area",
            "Calculate the area of a square or rectangle.",
            vec![p("length", Float), p("width", Float), p("round_result", Bool)],
        ),
        ToolSpec::new(
            "calculate_bmi",
            "Calculate the Body Mass Index and return the BMI category and health recommendations.",
            vec![
                p("weight", Float),
                p("height", Float),
                p("age", Int),
                p(
                    "gender",
                    OneOf(vec!["male".into(), "female".into(), "other".into()]),
                ),
            ],
        ),
        ToolSpec::new(
            "calculate_tip",
            "Calculate the tip amount based on total expenditure, country, and service quality.",
            vec![p("total_spend", Float), p("country", Str), p("service", Str)],
        ),
        ToolSpec::new(
            "calculate_trip_cost",
            "Calculate the total cost of a trip from distance, fuel efficiency, and fuel cost.",
            vec![
                p("distance", Float),
                p("fuel_efficiency", Float),
                p("fuel_cost_per_liter", Float),
            ],
        ),
        ToolSpec::new(
            "count_letter",
            "Count occurrences of a single letter in a word.",
            vec![p("word", Str), p("letter", Str)],
        ),
        ToolSpec::new(
            "date_difference",
            "Calculate the number of days between two dates.",
            vec![p("start_date", Date), p("end_date", Date), p("include_end", Bool)],
        ),
        ToolSpec::new(
            "difference_of_squares",
            "Calculate the difference between the squares of two numbers.",
            vec![p("a", Float), p("b", Float)],
        ),
        ToolSpec::new(
            "get_capital",
            "Return the capital of a given country.",
            vec![p("country", Str)],
        ),
        ToolSpec::new(
            "get_timezone",
            "Return the timezone of a given city in the world.",
            vec![
                p("city", Str),
                p("state", Str),
                p("country", Str),
                p("mail_code", Str),
            ],
        ),
        ToolSpec::new(
            "get_weather_info",
            "Return the current time in PST with the weather and temperature for a city.",
            vec![p("city", Str)],
        ),
        ToolSpec::new(
            "password_generator",
            "Generate a random password with optional numbers, special characters, and capitals.",
            vec![
                p("length", Int),
                p("use_numbers", Str),
                p("use_special_chars", Str),
                p("use_caps", Str),
            ],
        ),
        ToolSpec::new(
            "playlist_duration_calculator",
            "Calculate the total duration of a playlist.",
            vec![
                p("number_of_songs", Int),
                p("average_song_length", Float),
                p("include_breaks", Bool),
                p("break_duration", Float),
            ],
        ),
        ToolSpec::new(
            "power",
            "Raise a base to an exponent.",
            vec![p("base", Float), p("exponent", Float)],
        ),
        ToolSpec::new(
            "sentiment_analysis",
            "Analyze the sentiment of the given text.",
            vec![p("text", Str)],
        ),
        ToolSpec::new(
            "simple_interest",
            "Calculate simple interest.",
            vec![p("principal", Float), p("rate", Float), p("time", Float)],
        ),
        ToolSpec::new(
            "translate",
            "Translate text into a target language.",
            vec![p("text", Str), p("target_language", Str)],
        ),
        ToolSpec::new(
            "zodiac_sign",
            "Return the zodiac sign for a given birthdate.",
            vec![p("birthday", Date)],
        ),
    ]
}
