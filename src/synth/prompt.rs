//! Few-shot prompt template
//!
//! Layout: prefix, each example, suffix, joined by blank lines. `{subject}`
//! and `{extra}` are the only placeholders.

/// Seed examples shown to the model; one JSON record each.
const DEFAULT_EXAMPLES: [&str; 7] = [
    r#"{"query": "What is the weather in Paris", "answer": {"function": "get_weather", "arguments": {"city": "Paris"}}}"#,
    r#"{"query": "What is the weather in London", "answer": {"function": "get_weather", "arguments": {"city": "London"}}}"#,
    r#"{"query": "Translate "Good morning"" to French, "answer": {"function": "translate", "arguments": {"text": "Good morning", "target_language": "French"}}}"#,
    r#"{"query": "What is the area of a square with length 1 and width 2 when rounded to the nearest whole number", "answer": {"function": "calculate_area", "arguments": {"length": "1", "width": "2", "round_result": "True"}}}"#,
    r#"{"query": "What time zone is Agra, Uttar Pradesh in India with the mail code 282001 in?", "answer": {"function": "get_timezone", "arguments": {"city": "Agra", "state": "Uttar Pradesh", "country": "India", "mail_code": "282001"}}}"#,
    r#"{"query": "What is the timezone for Oakland, California USA 94611?", "answer": {"function": "get_timezone", "arguments": {"city": "Oakland", "state": "California", "country": "United States", "mail_code": "94611"}}}"#,
    r#"{"query": "What is my BMI when I weigh 75 kg and am 170 cm tall as a male at the age of 55", "answer": {"function": "calculate_bmi", "arguments": {"weight": "75", "height": "170", "age": "55", "gender": "male"}}}"#,
];

const DEFAULT_PREFIX: &str =
    "This is a test about generating synthetic data about {subject}. Examples below:";
const DEFAULT_SUFFIX: &str =
    "Now you generate synthetic data about {subject}. Make sure to {extra}:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FewShotTemplate {
    pub prefix: String,
    pub examples: Vec<String>,
    pub suffix: String,
}

impl FewShotTemplate {
    pub fn new(prefix: &str, examples: Vec<String>, suffix: &str) -> Self {
        FewShotTemplate {
            prefix: prefix.to_string(),
            examples,
            suffix: suffix.to_string(),
        }
    }

    pub fn render(&self, subject: &str, extra: &str) -> String {
        let fill = |s: &str| s.replace("{subject}", subject).replace("{extra}", extra);

        let mut parts = Vec::with_capacity(self.examples.len() + 2);
        parts.push(fill(&self.prefix));
        parts.extend(self.examples.iter().cloned());
        parts.push(fill(&self.suffix));
        parts.join("\n\n")
    }
}

impl Default for FewShotTemplate {
    fn default() -> Self {
        Self::new(
            DEFAULT_PREFIX,
            DEFAULT_EXAMPLES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_SUFFIX,
        )
    }
}
