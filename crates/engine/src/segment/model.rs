use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_utils::{deserialize_timestamp_millis, serialize_timestamp_millis};

/// Appended once to a record's text when its line bound is reached.
pub const TRUNCATION_MARKER: &str = "[... truncated ...]";

/// One logical log entry, possibly spanning several input lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Parsed instant of the first line, `None` when absent or unparseable
    #[serde(
        serialize_with = "serialize_timestamp_millis",
        deserialize_with = "deserialize_timestamp_millis"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Single-line summary of the first line; never empty for non-empty input
    pub message: String,
    /// All contributing lines joined by `\n`, plus the truncation marker if any
    pub text: String,
}

impl Record {
    /// Lines of `text`, truncation marker included.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Whether `text` ends in the truncation marker on its own line. A
    /// source line that is literally the marker reads as truncated too;
    /// [`SegmentStats`] is the exact count.
    pub fn is_truncated(&self) -> bool {
        self.text.ends_with(TRUNCATION_MARKER)
            && self.text.len() > TRUNCATION_MARKER.len()
            && self.text[..self.text.len() - TRUNCATION_MARKER.len()].ends_with('\n')
    }
}

/// Counters collected alongside a segmentation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    pub records: usize,
    pub truncated_records: usize,
    /// Continuation lines discarded past the per-record bound
    pub dropped_lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_json_shape() {
        let record = Record {
            timestamp: Some(Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap()),
            message: "ERROR x".to_string(),
            text: "2026-01-01 10:00:00 ERROR x\n  at f()".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2026-01-01T10:00:00.000Z","message":"ERROR x","text":"2026-01-01 10:00:00 ERROR x\n  at f()"}"#
        );
    }

    #[test]
    fn test_record_null_timestamp() {
        let record = Record {
            timestamp: None,
            message: "a".to_string(),
            text: "a\nb".to_string(),
        };
        let value: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert!(value["timestamp"].is_null());
        assert_eq!(value["text"], "a\nb");
    }

    #[test]
    fn test_is_truncated() {
        let mut record = Record {
            timestamp: None,
            message: "START".to_string(),
            text: format!("START\n{}", TRUNCATION_MARKER),
        };
        assert!(record.is_truncated());
        assert_eq!(record.lines().count(), 2);

        record.text = TRUNCATION_MARKER.to_string();
        assert!(!record.is_truncated());
    }
}
