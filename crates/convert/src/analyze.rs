//! Gap, statistics and similar-line reports for a log file.
//!
//! Each report needs timestamps, so without a detected format the
//! configured fallback regex is used; with neither the command fails.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use engine::analysis::{
    chunk_stats, find_similar_lines, find_top_gaps, format_duration, ChunkStats, LineNormalizer,
    SimilarLines, TopGaps,
};
use engine::SegmentOptions;
use tracing::info;

use crate::orchestrator::{file_dates, read_log_lines, Orchestrator, TimestampRecognizer};

pub fn gaps<R: TimestampRecognizer>(
    orchestrator: &Orchestrator<R>,
    input: &Path,
    options: &SegmentOptions,
    top: usize,
) -> Result<TopGaps> {
    let outcome = orchestrator.convert_file(input, options, orchestrator.has_fallback())?;
    Ok(find_top_gaps(&outcome.records, top))
}

pub fn stats<R: TimestampRecognizer>(
    orchestrator: &Orchestrator<R>,
    input: &Path,
    options: &SegmentOptions,
    multiplier: f64,
) -> Result<ChunkStats> {
    let outcome = orchestrator.convert_file(input, options, orchestrator.has_fallback())?;
    Ok(chunk_stats(&outcome.records, multiplier))
}

pub fn similar<R: TimestampRecognizer>(orchestrator: &Orchestrator<R>, input: &Path, top: usize) -> Result<SimilarLines> {
    let lines = read_log_lines(input)?;
    let dates = file_dates(input)?;
    let name = input.display().to_string();
    let (matcher, source) = orchestrator.select_matcher(&name, &lines, dates, orchestrator.has_fallback())?;

    let normalizer = LineNormalizer::new().context("Failed to build line normalizer")?;
    let result = find_similar_lines(&lines, &matcher, &normalizer, top);
    info!(
        file = %name,
        source = %source,
        analyzed = result.total_analyzed,
        patterns = result.unique_patterns,
        "Similar line analysis complete"
    );
    Ok(result)
}

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ms(value: f64) -> String {
    format_duration(value.round() as i64)
}

pub fn render_gaps(top: &TopGaps) -> String {
    let mut out = vec![format!(
        "{} timestamped entries spanning {}",
        top.total_records,
        format_duration(top.log_span_ms)
    )];
    if top.gaps.is_empty() {
        out.push("No gaps between timestamped entries".to_string());
    }
    out.extend(top.gaps.iter().map(ToString::to_string));
    out.join("\n")
}

pub fn render_stats(result: &ChunkStats) -> String {
    let s = &result.stats;
    if s.count == 0 {
        return "No gaps between timestamped entries".to_string();
    }

    let mut out = vec![
        format!("Gaps: {}", s.count),
        format!("Mean: {}  Median: {}", ms(s.mean), ms(s.median)),
        format!("Min: {}  Max: {}", ms(s.min), ms(s.max)),
        format!("P90: {}  P95: {}  P99: {}", ms(s.p90), ms(s.p95), ms(s.p99)),
        format!("Std dev: {}", ms(s.std_dev)),
        format!("Skewness: {:.3}  Kurtosis: {:.3}", s.skewness, s.kurtosis),
        format!("Outliers: {}", result.outliers.len()),
    ];
    out.extend(result.outliers.iter().map(ToString::to_string));
    out.join("\n")
}

pub fn render_similar(result: &SimilarLines) -> String {
    let mut out = vec![format!(
        "{} timestamped lines, {} patterns",
        result.total_analyzed, result.unique_patterns
    )];
    for line in &result.lines {
        out.push(format!(
            "{}x {} ({} -> {})\n  >> {}",
            line.count,
            line.pattern,
            iso(&line.first_timestamp),
            iso(&line.last_timestamp),
            line.example
        ));
    }
    out.join("\n")
}
