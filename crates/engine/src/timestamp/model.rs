use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Position of a matched timestamp within a line.
///
/// `start` and `end` are byte offsets into the line the match was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampMatch {
    /// The matched substring
    pub raw: String,
    pub start: usize,
    pub end: usize,
}

impl TimestampMatch {
    /// Build a match from a line and a byte range inside it.
    /// Returns `None` when the range is not a valid slice of `line`.
    pub fn from_span(line: &str, start: usize, end: usize) -> Option<Self> {
        line.get(start..end).map(|raw| Self {
            raw: raw.to_string(),
            start,
            end,
        })
    }
}

/// Outcome of classifying one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Opens a new record. The span is absent when the line starts a record
    /// but no timestamp could be located in it.
    Start(Option<TimestampMatch>),
    /// Absorbed into the currently open record.
    Continuation,
}

impl LineClass {
    pub fn is_start(&self) -> bool {
        matches!(self, LineClass::Start(_))
    }
}

/// File creation and modification instants.
///
/// Timestamps in a log are expected to fall inside this window; detection
/// uses it to rank candidate formats and to fill in missing date parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDates {
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FileDates {
    pub fn new(created_at: DateTime<Utc>, modified_at: DateTime<Utc>) -> Self {
        Self { created_at, modified_at }
    }

    /// Window used for "in range" scoring: one day of slack before creation,
    /// one hour after the last modification.
    pub fn tolerance_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.created_at - Duration::days(1),
            self.modified_at + Duration::hours(1),
        )
    }

    /// Score how plausible `instant` is for this file.
    ///
    /// 1.0 inside the tolerance window, `1 / (1 + days)` outside it, and 0
    /// once the distance exceeds two years.
    pub fn score(&self, instant: DateTime<Utc>) -> f64 {
        let (from, to) = self.tolerance_window();
        if instant >= from && instant <= to {
            return 1.0;
        }

        let distance = if instant < from { from - instant } else { instant - to };
        let days = distance.num_milliseconds() as f64 / MILLIS_PER_DAY;
        if days > 365.0 * 2.0 {
            0.0
        } else {
            1.0 / (1.0 + days)
        }
    }
}

pub(crate) const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("Invalid timestamp regex: {0}")]
    InvalidRegex(String),

    #[error("Invalid timestamp format string: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_span_valid() {
        let m = TimestampMatch::from_span("2026-01-01 boot", 0, 10).unwrap();
        assert_eq!(m.raw, "2026-01-01");
        assert_eq!((m.start, m.end), (0, 10));
    }

    #[test]
    fn test_from_span_rejects_bad_ranges() {
        assert!(TimestampMatch::from_span("short", 2, 40).is_none());
        // 'é' is two bytes; offset 1 splits it
        assert!(TimestampMatch::from_span("é", 1, 2).is_none());
    }

    #[test]
    fn test_tolerance_window() {
        let created = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let modified = Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap();
        let (from, to) = FileDates::new(created, modified).tolerance_window();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 1, 9, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2026, 1, 12, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_score_in_and_out_of_range() {
        let dates = FileDates::new(
            Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap(),
        );

        assert_eq!(dates.score(Utc.with_ymd_and_hms(2026, 1, 11, 8, 0, 0).unwrap()), 1.0);
        // One day before the slack starts
        let early = dates.score(Utc.with_ymd_and_hms(2026, 1, 8, 0, 0, 0).unwrap());
        assert!((early - 0.5).abs() < 1e-9);
        // Far outside the window
        assert_eq!(dates.score(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()), 0.0);
    }
}
