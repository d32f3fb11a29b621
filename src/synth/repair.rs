//! Text Repair Filter
//!
//! Models regularly emit almost-JSON: a quoted word inside a query string
//! (`"Translate "hello" to French"`) or a single-quoted character value
//! (`"letter": 'a'`). This is a bounded repair pass for exactly those two
//! shapes, not a general JSON fixer.

use super::ParsedExample;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// A double-quoted run of letters
static QUOTED_WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""([a-zA-Z]+)""#).ok());

/// A single letter wrapped in single quotes
static SINGLE_QUOTED_CHAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"'([a-zA-Z])'").ok());

/// Parse `text` as a record, falling back to one repair attempt.
///
/// Returns `None` when both attempts fail; the rejection is final.
pub fn repair_and_parse(text: &str) -> Option<ParsedExample> {
    let text = text.trim();

    match serde_json::from_str::<ParsedExample>(text) {
        Ok(example) => Some(example),
        Err(first) => {
            let fixed = fix_quotes(text);
            match serde_json::from_str::<ParsedExample>(&fixed) {
                Ok(example) => {
                    debug!("[Repair] Recovered record after: {}", first);
                    Some(example)
                }
                Err(second) => {
                    debug!("[Repair] Unrecoverable record: {}", second);
                    None
                }
            }
        }
    }
}

/// Apply both quote rewrites.
///
/// A quoted word is left alone only when it is a whole key or value: preceded
/// by `{`, `[`, `,` or `:` and followed by `:`, `,`, `}` or `]`. Anywhere else
/// its quotes are escaped.
pub fn fix_quotes(text: &str) -> String {
    let escaped = match QUOTED_WORD.as_ref() {
        Some(re) => {
            let mut out = String::with_capacity(text.len() + 16);
            let mut last = 0;
            for m in re.find_iter(text) {
                out.push_str(&text[last..m.start()]);
                if is_whole_token(&text[..m.start()], &text[m.end()..]) {
                    out.push_str(m.as_str());
                } else {
                    out.push_str("\\\"");
                    out.push_str(&m.as_str()[1..m.len() - 1]);
                    out.push_str("\\\"");
                }
                last = m.end();
            }
            out.push_str(&text[last..]);
            out
        }
        None => text.to_string(),
    };

    match SINGLE_QUOTED_CHAR.as_ref() {
        Some(re) => re.replace_all(&escaped, "\"$1\"").into_owned(),
        None => escaped,
    }
}

fn is_whole_token(before: &str, after: &str) -> bool {
    matches!(
        before.trim_end().chars().last(),
        None | Some('{') | Some('[') | Some(',') | Some(':')
    ) && matches!(
        after.trim_start().chars().next(),
        None | Some(':') | Some(',') | Some('}') | Some(']')
    )
}
