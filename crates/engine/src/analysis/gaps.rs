//! Gaps: time between one timestamped record and the next.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::segment::Record;

/// Time between a record and the next timestamped record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapRecord {
    /// Index of the record in the segmented output
    pub entry: usize,
    pub timestamp: DateTime<Utc>,
    pub next_timestamp: DateTime<Utc>,
    pub duration_ms: i64,
    /// First line of the record
    pub text: String,
}

impl fmt::Display for GapRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entry {}: {} gap ({} -> {})\n  >> {}",
            self.entry + 1,
            format_duration(self.duration_ms),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.next_timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.text
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopGaps {
    /// Longest first; equal durations in record order
    pub gaps: Vec<GapRecord>,
    /// Records carrying a timestamp
    pub total_records: usize,
    /// Last timestamp minus first timestamp
    pub log_span_ms: i64,
}

/// Positive gaps between consecutive timestamped records, in record order.
/// Zero and negative gaps (clock skew, out-of-order writes) are skipped.
fn positive_gaps(records: &[Record]) -> impl Iterator<Item = GapRecord> + '_ {
    let timed: Vec<(usize, DateTime<Utc>)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.timestamp.map(|ts| (i, ts)))
        .collect();

    (1..timed.len()).filter_map(move |k| {
        let (entry, timestamp) = timed[k - 1];
        let (_, next_timestamp) = timed[k];
        let duration_ms = (next_timestamp - timestamp).num_milliseconds();
        (duration_ms > 0).then(|| GapRecord {
            entry,
            timestamp,
            next_timestamp,
            duration_ms,
            text: first_line(&records[entry]).to_string(),
        })
    })
}

fn first_line(record: &Record) -> &str {
    record.text.split('\n').next().unwrap_or_default()
}

/// Every positive gap, in record order.
pub fn extract_all_gaps(records: &[Record]) -> Vec<GapRecord> {
    positive_gaps(records).collect()
}

/// The `top_n` longest gaps in one pass, keeping a min-heap of size `top_n`.
pub fn find_top_gaps(records: &[Record], top_n: usize) -> TopGaps {
    let mut first = None;
    let mut last = None;
    let mut total_records = 0;
    for ts in records.iter().filter_map(|r| r.timestamp) {
        first.get_or_insert(ts);
        last = Some(ts);
        total_records += 1;
    }

    let log_span_ms = match (first, last) {
        (Some(first), Some(last)) if total_records >= 2 => (last - first).num_milliseconds(),
        _ => 0,
    };

    // Smallest duration on top; among equals the latest record goes first
    let mut heap: BinaryHeap<Reverse<(i64, Reverse<usize>)>> = BinaryHeap::with_capacity(top_n + 1);
    let mut kept = Vec::new();

    if top_n > 0 {
        for gap in positive_gaps(records) {
            let key = (gap.duration_ms, Reverse(kept.len()));
            if heap.len() < top_n {
                heap.push(Reverse(key));
                kept.push(Some(gap));
            } else if heap.peek().is_some_and(|Reverse((min, _))| gap.duration_ms > *min) {
                if let Some(Reverse((_, Reverse(evicted)))) = heap.pop() {
                    kept[evicted] = None;
                }
                heap.push(Reverse(key));
                kept.push(Some(gap));
            }
        }
    }

    let mut gaps: Vec<GapRecord> = kept.into_iter().flatten().collect();
    gaps.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms).then(a.entry.cmp(&b.entry)));

    tracing::debug!(
        records = total_records,
        gaps = gaps.len(),
        span_ms = log_span_ms,
        "analysis: top gaps"
    );

    TopGaps {
        gaps,
        total_records,
        log_span_ms,
    }
}

/// Human-readable duration: `850ms`, `2.50s`, `3m 12.0s`, `2h 5m`.
pub fn format_duration(ms: i64) -> String {
    if ms < 1_000 {
        return format!("{}ms", ms);
    }
    if ms < 60_000 {
        return format!("{:.2}s", ms as f64 / 1_000.0);
    }
    if ms < 3_600_000 {
        let min = ms / 60_000;
        let sec = (ms % 60_000) as f64 / 1_000.0;
        return format!("{}m {:.1}s", min, sec);
    }
    let hrs = ms / 3_600_000;
    let min = (ms % 3_600_000) / 60_000;
    format!("{}h {}m", hrs, min)
}
