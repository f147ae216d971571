//! Lens counts over a window of a log file.

use std::path::Path;

use anyhow::{Context, Result};
use engine::lens::{read_lens_patterns, visible_line_numbers, LensEngine, LensEntry, LensReport, LogPatternsFile};
use tracing::info;

use crate::config::LensConfig;

/// Pattern file named on the command line, else the configured one, else
/// the starter lenses.
pub fn load_entries(explicit: Option<&Path>, config: &LensConfig) -> Result<Vec<LensEntry>> {
    match explicit.or(config.patterns_file.as_deref()) {
        Some(path) => read_lens_patterns(path).with_context(|| format!("Failed to load lenses from {}", path.display())),
        None => Ok(LogPatternsFile::starter().into_entries()),
    }
}

/// Apply `entries` to lines `from..=to` of `lines`.
pub fn scan(lines: &[String], entries: Vec<LensEntry>, from: usize, to: Option<usize>) -> LensReport {
    let window = visible_line_numbers(&[(from, to.unwrap_or(usize::MAX))], lines.len());
    let visible: Vec<(usize, &str)> = window.iter().map(|&n| (n, lines[n].as_str())).collect();

    let engine = LensEngine::new(entries);
    let report = engine.apply(&visible);
    let (lines_scanned, matches, _) = engine.stats();
    info!(lenses = engine.len(), lines = lines_scanned, matches, "Lens pass complete");
    report
}

/// One line per lens: `label (category) colour: count`, then the status bar
/// summary when any lens is shown there.
pub fn render(report: &LensReport) -> String {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|r| format!("{} ({}) {}: {}", r.label, r.category, r.color, r.count()))
        .collect();

    let status: Vec<String> = report
        .status_items()
        .iter()
        .map(|item| format!("{} {}", item.label, item.count))
        .collect();
    if !status.is_empty() {
        lines.push(format!("Status bar: {}", status.join(" | ")));
    }
    lines.join("\n")
}
