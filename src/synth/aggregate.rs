//! Deduplicator / Aggregator
//!
//! Records are deduplicated by their canonical key: the JSON serialization with
//! object keys sorted. serde_json's default `Map` is a `BTreeMap`, so going
//! through `Value` sorts keys at every depth.

use super::parser::Batch;
use super::{ExampleSet, ParsedExample};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::info;

/// Sorted-key JSON serialization used for structural equality
pub fn canonical_key(example: &ParsedExample) -> String {
    match serde_json::to_value(example) {
        Ok(value) => value.to_string(),
        // ParsedExample only holds strings and string maps
        Err(_) => format!("{:?}", example),
    }
}

/// Incremental accumulator; feed batches in sequential order, then `finish`.
#[derive(Debug, Default)]
pub struct Aggregator {
    seen: HashSet<String>,
    set: ExampleSet,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: Batch) {
        self.set.number_failed += batch.failed;
        self.set.number_generated += batch.accepted.len();

        for example in batch.accepted {
            if self.seen.insert(canonical_key(&example)) {
                self.set.queries.push(example);
            }
        }
    }

    pub fn finish(self, randomize: bool) -> ExampleSet {
        self.finish_with_rng(randomize, &mut rand::thread_rng())
    }

    pub fn finish_with_rng<R: Rng + ?Sized>(mut self, randomize: bool, rng: &mut R) -> ExampleSet {
        if randomize {
            self.set.queries.shuffle(rng);
        }
        info!(
            "📦 [Aggregator] {} unique of {} generated, {} failed",
            self.set.queries.len(),
            self.set.number_generated,
            self.set.number_failed
        );
        self.set
    }
}

/// Fold `batches` into one deduplicated `ExampleSet`.
pub fn aggregate<I>(batches: I, randomize: bool) -> ExampleSet
where
    I: IntoIterator<Item = Batch>,
{
    let mut aggregator = Aggregator::new();
    for batch in batches {
        aggregator.push(batch);
    }
    aggregator.finish(randomize)
}
