//! Log to JSONL conversion: read, detect, pick a matcher, segment.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use engine::segment::{segment_with_stats, Record, SegmentOptions, SegmentStats};
use engine::timestamp::{
    CustomFormat, DetectionResult, FileDates, NoTimestamps, StartLineMatcher, TimestampDetector,
};
use tracing::{info, warn};

use crate::error::{ConvertError, ConvertResult};

/// Detects the timestamp format of a log.
#[cfg_attr(test, mockall::automock)]
pub trait TimestampRecognizer {
    fn detect(&self, lines: &[String], dates: FileDates) -> DetectionResult;
}

impl TimestampRecognizer for TimestampDetector {
    fn detect(&self, lines: &[String], dates: FileDates) -> DetectionResult {
        TimestampDetector::detect(self, lines, dates)
    }
}

/// Which matcher segmented the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatcherSource {
    Detected(&'static str),
    Fallback(String),
    /// No start lines at all: the whole file becomes one entry
    None,
}

impl fmt::Display for MatcherSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherSource::Detected(pattern) => write!(f, "detected {}", pattern),
            MatcherSource::Fallback(regex) => write!(f, "fallback /{}/", regex),
            MatcherSource::None => f.write_str("none"),
        }
    }
}

#[derive(Debug)]
pub struct JsonlOutcome {
    pub records: Vec<Record>,
    pub stats: SegmentStats,
    pub source: MatcherSource,
}

impl JsonlOutcome {
    pub fn all_timestamps_missing(&self) -> bool {
        self.records.iter().all(|r| r.timestamp.is_none())
    }
}

/// Runs detection and segmentation with an injected recognizer.
pub struct Orchestrator<R> {
    recognizer: R,
    fallback: Option<CustomFormat>,
}

impl<R: TimestampRecognizer> Orchestrator<R> {
    pub fn new(recognizer: R, fallback: Option<CustomFormat>) -> Self {
        Self { recognizer, fallback }
    }

    /// Whether a fallback regex can stand in for a detected format.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn detect(&self, lines: &[String], dates: FileDates) -> DetectionResult {
        self.recognizer.detect(lines, dates)
    }

    /// Detect the format of `lines` and pick the matcher to segment them
    /// with. `proceed` allows going on without a detected format.
    pub fn select_matcher(
        &self,
        name: &str,
        lines: &[String],
        dates: FileDates,
        proceed: bool,
    ) -> ConvertResult<(Box<dyn StartLineMatcher + '_>, MatcherSource)> {
        let detection = self.recognizer.detect(lines, dates);

        let selected: (Box<dyn StartLineMatcher + '_>, MatcherSource) = match detection.format {
            Some(format) => {
                info!(pattern = format.pattern(), confidence = format.score(), "Using detected timestamp format");
                let pattern = format.pattern();
                (Box::new(format), MatcherSource::Detected(pattern))
            }
            None if !proceed => {
                warn!(file = name, "No timestamp format detected");
                return Err(ConvertError::NoTimestampFormat(name.to_string()));
            }
            None => match &self.fallback {
                Some(custom) => {
                    warn!(regex = custom.regex(), "No timestamp format detected, using configured fallback regex");
                    (Box::new(custom), MatcherSource::Fallback(custom.regex().to_string()))
                }
                None => {
                    warn!("No timestamp format detected, converting without timestamps");
                    (Box::new(NoTimestamps), MatcherSource::None)
                }
            },
        };
        Ok(selected)
    }

    /// Segment already split lines. `proceed` allows conversion without a
    /// detected format.
    pub fn convert_lines(
        &self,
        name: &str,
        lines: &[String],
        dates: FileDates,
        options: &SegmentOptions,
        proceed: bool,
    ) -> ConvertResult<JsonlOutcome> {
        let (matcher, source) = self.select_matcher(name, lines, dates, proceed)?;

        let (records, stats) = segment_with_stats(lines, matcher, options);
        if records.is_empty() {
            return Err(ConvertError::NoEntries(name.to_string()));
        }

        let outcome = JsonlOutcome { records, stats, source };
        if outcome.all_timestamps_missing() {
            warn!(
                file = name,
                "No timestamps were recognized; every entry has timestamp = null"
            );
        }
        Ok(outcome)
    }

    /// Read `input` and segment it.
    pub fn convert_file(&self, input: &Path, options: &SegmentOptions, proceed: bool) -> Result<JsonlOutcome> {
        let lines = read_log_lines(input)?;
        let dates = file_dates(input)?;
        info!(file = %input.display(), lines = lines.len(), "Converting log to JSONL");

        let outcome = self.convert_lines(&input.display().to_string(), &lines, dates, options, proceed)?;
        info!(
            entries = outcome.stats.records,
            truncated = outcome.stats.truncated_records,
            dropped_lines = outcome.stats.dropped_lines,
            "Conversion complete"
        );
        Ok(outcome)
    }
}

/// Split a file on `\n`, dropping a trailing `\r` from each line. A final
/// newline does not produce an extra empty line.
pub fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(split_lines(&String::from_utf8_lossy(&bytes)))
}

pub(crate) fn split_lines(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    let content = content.strip_suffix('\n').unwrap_or(content);
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Creation and modification time of `path`. Platforms without a creation
/// time use the modification time for both.
pub fn file_dates(path: &Path) -> Result<FileDates> {
    let metadata = fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    let created = metadata.created().unwrap_or(modified);
    Ok(FileDates::new(DateTime::<Utc>::from(created), DateTime::<Utc>::from(modified)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use engine::timestamp::{DetectedFormat, FormatKind};
    use std::io::Write;

    fn dates() -> FileDates {
        FileDates::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
        )
    }

    fn detected(kind: FormatKind) -> DetectionResult {
        DetectionResult {
            format: Some(DetectedFormat::new(kind, dates()).unwrap()),
            sample_parsed: Vec::new(),
            lines_scanned: 1,
            match_rate: 1.0,
            file_range: None,
        }
    }

    fn undetected() -> DetectionResult {
        DetectionResult {
            format: None,
            sample_parsed: Vec::new(),
            lines_scanned: 0,
            match_rate: 0.0,
            file_range: None,
        }
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_uses_detected_format() {
        let mut recognizer = MockTimestampRecognizer::new();
        recognizer
            .expect_detect()
            .times(1)
            .returning(|_, _| detected(FormatKind::IsoSpace));

        let orchestrator = Orchestrator::new(recognizer, None);
        let input = lines(&["2026-01-01 10:00:00 ERROR x", "  at f()", "2026-01-01 10:00:01 INFO y"]);
        let outcome = orchestrator
            .convert_lines("app.log", &input, dates(), &SegmentOptions::default(), false)
            .unwrap();

        assert_eq!(outcome.source, MatcherSource::Detected("yyyy-MM-dd HH:mm:ss.SSS"));
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].message, "ERROR x");
        assert!(!outcome.all_timestamps_missing());
    }

    #[test]
    fn test_stops_without_format_unless_confirmed() {
        let mut recognizer = MockTimestampRecognizer::new();
        recognizer.expect_detect().returning(|_, _| undetected());

        let orchestrator = Orchestrator::new(recognizer, None);
        let input = lines(&["a", "b"]);

        let err = orchestrator
            .convert_lines("app.log", &input, dates(), &SegmentOptions::default(), false)
            .unwrap_err();
        assert!(matches!(err, ConvertError::NoTimestampFormat(_)));

        let outcome = orchestrator
            .convert_lines("app.log", &input, dates(), &SegmentOptions::default(), true)
            .unwrap();
        assert_eq!(outcome.source, MatcherSource::None);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].text, "a\nb");
        assert!(outcome.all_timestamps_missing());
    }

    #[test]
    fn test_falls_back_to_configured_regex() {
        let mut recognizer = MockTimestampRecognizer::new();
        recognizer.expect_detect().returning(|_, _| undetected());

        let fallback = CustomFormat::new(r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}", Some("%d/%m/%Y %H:%M")).unwrap();
        let orchestrator = Orchestrator::new(recognizer, Some(fallback));
        let input = lines(&["@ 05/01/2026 10:30 up", "detail", "@ 05/01/2026 10:31 down"]);

        let outcome = orchestrator
            .convert_lines("app.log", &input, dates(), &SegmentOptions::default(), true)
            .unwrap();
        assert!(matches!(outcome.source, MatcherSource::Fallback(_)));
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.records[0].timestamp,
            Some(Utc.with_ymd_and_hms(2026, 1, 5, 10, 30, 0).unwrap())
        );
        assert_eq!(outcome.records[0].message, "@  up");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let mut recognizer = MockTimestampRecognizer::new();
        recognizer.expect_detect().returning(|_, _| undetected());

        let orchestrator = Orchestrator::new(recognizer, None);
        let err = orchestrator
            .convert_lines("empty.log", &[], dates(), &SegmentOptions::default(), true)
            .unwrap_err();
        assert!(matches!(err, ConvertError::NoEntries(_)));
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\r\nb\nc\r\n"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert_eq!(split_lines("\n"), vec![""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_convert_file_with_real_detector() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        writeln!(file, "{} INFO starting", now).unwrap();
        writeln!(file, "{} ERROR failed", now).unwrap();
        writeln!(file, "    at main.rs:10").unwrap();

        let orchestrator = Orchestrator::new(TimestampDetector::new().unwrap(), None);
        let outcome = orchestrator
            .convert_file(file.path(), &SegmentOptions::default(), false)
            .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].message, "ERROR failed");
        assert_eq!(outcome.records[1].text.lines().count(), 2);
        assert!(outcome.records.iter().all(|r| r.timestamp.is_some()));
    }
}
