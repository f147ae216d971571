use chrono::{DateTime, Utc};

use crate::timestamp::{LineClass, StartLineMatcher};

use super::message::build_message;
use super::model::{Record, SegmentStats, TRUNCATION_MARKER};
use super::options::SegmentOptions;

/// Push-based log entry segmenter.
///
/// Splits a stream of lines into records:
/// - A start line (as classified by the matcher) closes the open record and opens a new one
/// - Any other line is appended to the open record
/// - Lines before the first start line form a record with no timestamp
/// - A record holds at most `max_multiline_size` lines; the overflow is
///   replaced by a single truncation marker
///
/// Records are returned from `push` as soon as the next start line arrives;
/// call `finish` at end of input for the last one.
pub struct Segmenter<M> {
    matcher: M,
    options: SegmentOptions,
    max_lines: usize,
    pending: Option<PendingRecord>,
    stats: SegmentStats,
}

impl<M: StartLineMatcher> Segmenter<M> {
    pub fn new(matcher: M, options: SegmentOptions) -> Self {
        let max_lines = options.effective_max();
        Self {
            matcher,
            options,
            max_lines,
            pending: None,
            stats: SegmentStats::default(),
        }
    }

    /// Feed one line (without its line separator).
    /// Returns the previous record when `line` starts a new one.
    pub fn push(&mut self, line: &str) -> Option<Record> {
        match self.matcher.classify(line) {
            LineClass::Start(span) => {
                tracing::trace!(has_span = span.is_some(), "segment: start line");
                let complete = self.flush();

                let timestamp = span
                    .as_ref()
                    .and_then(|m| self.matcher.parse_timestamp(&m.raw));
                let message = build_message(line, span.as_ref(), self.options.message_mode);
                self.pending = Some(PendingRecord::new(timestamp, message, line));

                complete
            }
            LineClass::Continuation => {
                match self.pending {
                    Some(ref mut record) => {
                        if record.line_count < self.max_lines {
                            record.add_line(line);
                        } else {
                            if !record.truncated {
                                tracing::debug!(
                                    max_lines = self.max_lines,
                                    "segment: max_multiline_size reached, truncating record"
                                );
                                record.truncate();
                            }
                            record.dropped += 1;
                        }
                    }
                    None => {
                        tracing::trace!("segment: continuation before first start line");
                        self.pending = Some(PendingRecord::new(None, line.to_string(), line));
                    }
                }
                None
            }
        }
    }

    /// Returns true if a record is open and not yet emitted.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Emit the open record, if any. Call at end of input.
    pub fn finish(&mut self) -> Option<Record> {
        self.flush()
    }

    pub fn stats(&self) -> SegmentStats {
        self.stats
    }

    fn flush(&mut self) -> Option<Record> {
        let record = self.pending.take()?;

        self.stats.records += 1;
        if record.truncated {
            self.stats.truncated_records += 1;
            self.stats.dropped_lines += record.dropped;
            tracing::debug!(
                dropped_lines = record.dropped,
                kept_lines = record.line_count,
                "segment: emitted truncated record"
            );
        }

        Some(record.into_record())
    }
}

/// Record under construction.
struct PendingRecord {
    timestamp: Option<DateTime<Utc>>,
    message: String,
    text: String,
    line_count: usize,
    truncated: bool,
    dropped: usize,
}

impl PendingRecord {
    fn new(timestamp: Option<DateTime<Utc>>, message: String, first_line: &str) -> Self {
        Self {
            timestamp,
            message,
            text: first_line.to_string(),
            line_count: 1,
            truncated: false,
            dropped: 0,
        }
    }

    fn add_line(&mut self, line: &str) {
        self.text.push('\n');
        self.text.push_str(line);
        self.line_count += 1;
    }

    fn truncate(&mut self) {
        self.text.push('\n');
        self.text.push_str(TRUNCATION_MARKER);
        self.truncated = true;
    }

    fn into_record(self) -> Record {
        Record {
            timestamp: self.timestamp,
            message: self.message,
            text: self.text,
        }
    }
}

/// Segment `lines` into records in a single forward pass.
pub fn segment<S, M>(lines: &[S], matcher: M, options: &SegmentOptions) -> Vec<Record>
where
    S: AsRef<str>,
    M: StartLineMatcher,
{
    segment_with_stats(lines, matcher, options).0
}

/// Like [`segment`], also reporting how many records were truncated and how
/// many lines were dropped.
pub fn segment_with_stats<S, M>(lines: &[S], matcher: M, options: &SegmentOptions) -> (Vec<Record>, SegmentStats)
where
    S: AsRef<str>,
    M: StartLineMatcher,
{
    let mut segmenter = Segmenter::new(matcher, options.clone());
    let mut records = Vec::new();

    for line in lines {
        if let Some(record) = segmenter.push(line.as_ref()) {
            records.push(record);
        }
    }
    if let Some(record) = segmenter.finish() {
        records.push(record);
    }

    let stats = segmenter.stats();
    tracing::debug!(
        lines = lines.len(),
        records = stats.records,
        truncated_records = stats.truncated_records,
        dropped_lines = stats.dropped_lines,
        "segment: pass complete"
    );
    (records, stats)
}
