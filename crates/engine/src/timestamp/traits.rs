use chrono::{DateTime, Utc};

pub use super::model::{LineClass, TimestampMatch};

/// Decides where records start and how their timestamps read.
///
/// Implementations must be stateless between calls: the same line always
/// classifies the same way regardless of what was classified before it.
/// Any regex cursor state is the implementation's to reset.
pub trait StartLineMatcher {
    /// Does `line` open a new record?
    fn is_start_line(&self, line: &str) -> bool;

    /// Locate the timestamp within a start line.
    fn extract_timestamp(&self, line: &str) -> Option<TimestampMatch>;

    /// Convert a matched substring into an instant.
    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>>;

    /// Classify a line in one step. The default runs the predicate and, for
    /// start lines only, the extractor. Regex-backed matchers override this to
    /// match once.
    fn classify(&self, line: &str) -> LineClass {
        if self.is_start_line(line) {
            LineClass::Start(self.extract_timestamp(line))
        } else {
            LineClass::Continuation
        }
    }
}

impl<M: StartLineMatcher + ?Sized> StartLineMatcher for &M {
    fn is_start_line(&self, line: &str) -> bool {
        (**self).is_start_line(line)
    }

    fn extract_timestamp(&self, line: &str) -> Option<TimestampMatch> {
        (**self).extract_timestamp(line)
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        (**self).parse_timestamp(raw)
    }

    fn classify(&self, line: &str) -> LineClass {
        (**self).classify(line)
    }
}

impl<M: StartLineMatcher + ?Sized> StartLineMatcher for Box<M> {
    fn is_start_line(&self, line: &str) -> bool {
        (**self).is_start_line(line)
    }

    fn extract_timestamp(&self, line: &str) -> Option<TimestampMatch> {
        (**self).extract_timestamp(line)
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        (**self).parse_timestamp(raw)
    }

    fn classify(&self, line: &str) -> LineClass {
        (**self).classify(line)
    }
}

/// Matcher assembled from three caller-supplied functions.
pub struct FnMatcher<P, E, T> {
    is_start: P,
    extract: E,
    parse: T,
}

impl<P, E, T> FnMatcher<P, E, T>
where
    P: Fn(&str) -> bool,
    E: Fn(&str) -> Option<TimestampMatch>,
    T: Fn(&str) -> Option<DateTime<Utc>>,
{
    pub fn new(is_start: P, extract: E, parse: T) -> Self {
        Self { is_start, extract, parse }
    }
}

impl<P, E, T> StartLineMatcher for FnMatcher<P, E, T>
where
    P: Fn(&str) -> bool,
    E: Fn(&str) -> Option<TimestampMatch>,
    T: Fn(&str) -> Option<DateTime<Utc>>,
{
    fn is_start_line(&self, line: &str) -> bool {
        (self.is_start)(line)
    }

    fn extract_timestamp(&self, line: &str) -> Option<TimestampMatch> {
        (self.extract)(line)
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        (self.parse)(raw)
    }
}

/// Matcher that never recognizes a start line. Segmenting with it yields a
/// single absent-timestamp record covering the whole input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTimestamps;

impl StartLineMatcher for NoTimestamps {
    fn is_start_line(&self, _line: &str) -> bool {
        false
    }

    fn extract_timestamp(&self, _line: &str) -> Option<TimestampMatch> {
        None
    }

    fn parse_timestamp(&self, _raw: &str) -> Option<DateTime<Utc>> {
        None
    }
}
