use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

use super::formats::{parse_iso, FormatKind};
use super::model::{FileDates, LineClass, TimestampError, TimestampMatch};
use super::prefix::level_prefix_len;
use super::traits::StartLineMatcher;

pub(crate) fn compile(pattern: &str) -> Result<RegexMatcher, TimestampError> {
    RegexMatcherBuilder::new()
        .multi_line(false)
        .build(pattern)
        .map_err(|e| TimestampError::InvalidRegex(e.to_string()))
}

/// A recognized timestamp format bound to the file it was detected in.
///
/// A line starts a record when the format matches right at its beginning
/// (after an optional level token such as `[INFO]`). Classification runs the
/// regex once and reports the span relative to the full line.
#[derive(Debug, Clone)]
pub struct DetectedFormat {
    kind: FormatKind,
    matcher: RegexMatcher,
    dates: FileDates,
    score: f64,
}

impl DetectedFormat {
    pub fn new(kind: FormatKind, dates: FileDates) -> Result<Self, TimestampError> {
        Ok(Self {
            kind,
            matcher: compile(&kind.regex())?,
            dates,
            score: 0.0,
        })
    }

    pub(crate) fn from_parts(kind: FormatKind, matcher: RegexMatcher, dates: FileDates, score: f64) -> Self {
        Self { kind, matcher, dates, score }
    }

    pub fn kind(&self) -> FormatKind {
        self.kind
    }

    pub fn pattern(&self) -> &'static str {
        self.kind.pattern()
    }

    /// Detection confidence; 0 for formats built directly.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn dates(&self) -> &FileDates {
        &self.dates
    }

    fn locate(&self, line: &str) -> Option<TimestampMatch> {
        let offset = level_prefix_len(line);
        let m = match_at_start(&self.matcher, line, offset)?;
        if !self.kind.accepts_boundary(line, m.1) {
            return None;
        }
        TimestampMatch::from_span(line, m.0, m.1)
    }
}

impl StartLineMatcher for DetectedFormat {
    fn is_start_line(&self, line: &str) -> bool {
        self.locate(line).is_some()
    }

    fn extract_timestamp(&self, line: &str) -> Option<TimestampMatch> {
        self.locate(line)
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        self.kind.parse(raw, &self.dates)
    }

    fn classify(&self, line: &str) -> LineClass {
        match self.locate(line) {
            Some(m) => LineClass::Start(Some(m)),
            None => LineClass::Continuation,
        }
    }
}

/// Match that begins exactly at `offset`, as `(start, end)` byte positions.
pub(crate) fn match_at_start(matcher: &RegexMatcher, line: &str, offset: usize) -> Option<(usize, usize)> {
    let m = matcher.find_at(line.as_bytes(), offset).ok().flatten()?;
    (m.start() == offset).then(|| (m.start(), m.end()))
}

/// User-configured timestamp regex with an optional chrono format string.
///
/// Unlike [`DetectedFormat`] the regex may match anywhere in the line.
/// Without a format string, or when it fails, the text is read as ISO-8601.
#[derive(Debug, Clone)]
pub struct CustomFormat {
    matcher: RegexMatcher,
    regex: String,
    format: Option<String>,
}

impl CustomFormat {
    pub fn new(regex: &str, format: Option<&str>) -> Result<Self, TimestampError> {
        if let Some(fmt) = format {
            if fmt.trim().is_empty() {
                return Err(TimestampError::InvalidFormat("format string is empty".into()));
            }
        }
        Ok(Self {
            matcher: compile(regex)?,
            regex: regex.to_string(),
            format: format.map(str::to_string),
        })
    }

    pub fn regex(&self) -> &str {
        &self.regex
    }

    fn locate(&self, line: &str) -> Option<TimestampMatch> {
        let m = self.matcher.find(line.as_bytes()).ok().flatten()?;
        TimestampMatch::from_span(line, m.start(), m.end())
    }

    fn parse_with_format(raw: &str, fmt: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|n| n.and_utc())
    }
}

impl StartLineMatcher for CustomFormat {
    fn is_start_line(&self, line: &str) -> bool {
        self.matcher.is_match(line.as_bytes()).unwrap_or(false)
    }

    fn extract_timestamp(&self, line: &str) -> Option<TimestampMatch> {
        self.locate(line)
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        self.format
            .as_deref()
            .and_then(|fmt| Self::parse_with_format(raw, fmt))
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.with_timezone(&Utc)))
            .or_else(|| parse_iso(raw))
    }

    fn classify(&self, line: &str) -> LineClass {
        match self.locate(line) {
            Some(m) => LineClass::Start(Some(m)),
            None => LineClass::Continuation,
        }
    }
}
