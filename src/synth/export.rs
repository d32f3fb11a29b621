//! File export and merging of generated example sets
//!
//! Files use the same layout callers already consume:
//! `{"number failed": .., "number generated": .., "queries": [..]}`.

use super::aggregate::Aggregator;
use super::parser::Batch;
use super::ExampleSet;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Pretty-print `set` to `path`, creating parent directories.
pub fn write_example_set(path: &Path, set: &ExampleSet) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = set.to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(
        "💾 [Export] Wrote {} queries to {}",
        set.len(),
        path.display()
    );
    Ok(())
}

/// Load an exported file. Missing counters default to zero; unknown answer
/// keys (e.g. a model-written `result`) are dropped.
pub fn read_example_set(path: &Path) -> Result<ExampleSet> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Merge files in the given order with canonical-key dedup; counters are summed.
pub fn combine_files<P: AsRef<Path>>(paths: &[P]) -> Result<ExampleSet> {
    let mut aggregator = Aggregator::new();
    let mut generated = 0;

    for path in paths {
        let set = read_example_set(path.as_ref())?;
        generated += set.number_generated;
        aggregator.push(Batch {
            accepted: set.queries,
            failed: set.number_failed,
        });
    }

    let mut combined = aggregator.finish(false);
    combined.number_generated = generated;
    Ok(combined)
}

/// Merge every `*.json` file in `dir`, in file-name order.
pub fn combine_dir(dir: &Path) -> Result<ExampleSet> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    info!(
        "🔗 [Export] Combining {} files from {}",
        paths.len(),
        dir.display()
    );
    combine_files(&paths)
}

/// `{dir}/{label}_{YYYYmmdd_HHMMSS}.json`
pub fn timestamped_path(dir: &Path, label: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.json", label, stamp))
}
