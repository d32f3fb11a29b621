//! Record Parser - splits one raw generation into records and classifies them

use super::repair::repair_and_parse;
use super::ParsedExample;
use tracing::warn;

/// Outcome of parsing one generation output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub accepted: Vec<ParsedExample>,
    pub failed: usize,
}

impl Batch {
    /// A batch whose request never produced text; every expected record failed.
    pub fn failed(expected: usize) -> Self {
        Batch {
            accepted: Vec::new(),
            failed: expected,
        }
    }

    /// Candidate records this batch accounts for
    pub fn processed(&self) -> usize {
        self.accepted.len() + self.failed
    }
}

/// Split `raw_output` on blank lines and run each candidate through the repair filter.
///
/// Whitespace-only fragments (leading/trailing blank lines, runs of 3+ newlines)
/// are not candidates and are not counted. A naive split-and-count would book
/// them as failures, so `failed` here can be lower than such a count for the
/// same text.
pub fn parse_batch(raw_output: &str) -> Batch {
    let normalized = raw_output.replace("\r\n", "\n");
    let mut batch = Batch::default();

    for candidate in normalized.split("\n\n") {
        if candidate.trim().is_empty() {
            continue;
        }
        match repair_and_parse(candidate) {
            Some(example) => batch.accepted.push(example),
            None => {
                batch.failed += 1;
                warn!("⚠️ [RecordParser] Skipping invalid JSON string: {}", candidate);
            }
        }
    }

    batch
}
