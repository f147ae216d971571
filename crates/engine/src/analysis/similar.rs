//! Similar: timestamped lines grouped by their shape.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use grep_matcher::Matcher;
use grep_regex::RegexMatcher;

use crate::timestamp::{LineClass, StartLineMatcher, TimestampMatch};

use super::AnalysisError;

/// One group of lines that differ only in numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarLine {
    /// Line with the timestamp removed and numbers replaced by `#`
    pub pattern: String,
    pub count: usize,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
    /// First line seen with this pattern
    pub example: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarLines {
    /// Most frequent first; equal counts in order of first appearance
    pub lines: Vec<SimilarLine>,
    /// Lines that carried a parseable timestamp
    pub total_analyzed: usize,
    pub unique_patterns: usize,
}

/// Replaces the variable parts of a line: decimal numbers, hex addresses
/// and dotted IPv4 addresses.
pub struct LineNormalizer {
    numbers: RegexMatcher,
    hex: RegexMatcher,
    ipv4: RegexMatcher,
}

impl LineNormalizer {
    pub fn new() -> Result<Self, AnalysisError> {
        let compile = |pattern: &str| {
            RegexMatcher::new(pattern).map_err(|e| AnalysisError::InvalidPattern(e.to_string()))
        };
        Ok(Self {
            numbers: compile(r"\b\d+\b")?,
            hex: compile(r"0x[0-9a-fA-F]+")?,
            ipv4: compile(r"\d+\.\d+\.\d+\.\d+")?,
        })
    }

    /// Remove the timestamp span by position, then collapse the numbers.
    pub fn normalize(&self, line: &str, span: Option<&TimestampMatch>) -> String {
        let stripped = match span.and_then(|m| Some((line.get(..m.start)?, line.get(m.end..)?))) {
            Some((before, after)) => format!("{}{}", before, after),
            None => line.to_string(),
        };

        let text = replace_all(&self.numbers, stripped.trim(), "#");
        let text = replace_all(&self.hex, &text, "0x#");
        replace_all(&self.ipv4, &text, "#.#.#.#")
    }
}

fn replace_all(matcher: &RegexMatcher, text: &str, with: &str) -> String {
    let mut dst = Vec::with_capacity(text.len());
    let replaced = matcher.replace(text.as_bytes(), &mut dst, |_, dst| {
        dst.extend_from_slice(with.as_bytes());
        true
    });
    if replaced.is_err() {
        return text.to_string();
    }
    String::from_utf8(dst).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Group the timestamped start lines of `lines` by normalized pattern and
/// keep the `top_n` most frequent.
pub fn find_similar_lines<S, M>(
    lines: &[S],
    matcher: &M,
    normalizer: &LineNormalizer,
    top_n: usize,
) -> SimilarLines
where
    S: AsRef<str>,
    M: StartLineMatcher + ?Sized,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<SimilarLine> = Vec::new();
    let mut total_analyzed = 0;

    for line in lines {
        let line = line.as_ref();
        let LineClass::Start(Some(span)) = matcher.classify(line) else {
            continue;
        };
        let Some(ts) = matcher.parse_timestamp(&span.raw) else {
            continue;
        };
        total_analyzed += 1;

        let pattern = normalizer.normalize(line, Some(&span));
        match index.get(&pattern) {
            Some(&i) => {
                groups[i].count += 1;
                groups[i].last_timestamp = ts;
            }
            None => {
                index.insert(pattern.clone(), groups.len());
                groups.push(SimilarLine {
                    pattern,
                    count: 1,
                    first_timestamp: ts,
                    last_timestamp: ts,
                    example: line.to_string(),
                });
            }
        }
    }

    let unique_patterns = groups.len();
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(top_n);

    tracing::debug!(
        analyzed = total_analyzed,
        patterns = unique_patterns,
        "analysis: similar lines"
    );

    SimilarLines {
        lines: groups,
        total_analyzed,
        unique_patterns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::FnMatcher;
    use chrono::NaiveDateTime;

    const TS_LEN: usize = 19;

    fn matcher() -> impl StartLineMatcher {
        FnMatcher::new(
            |line: &str| line.len() >= TS_LEN && line.as_bytes()[4] == b'-',
            |line: &str| TimestampMatch::from_span(line, 0, TS_LEN),
            |raw: &str| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|naive| naive.and_utc())
            },
        )
    }

    #[test]
    fn test_normalize() {
        let normalizer = LineNormalizer::new().unwrap();
        let line = "2026-01-01 10:00:00 user 42 from 10.0.0.7 at 0x7ffe1 took 3.5s";
        let span = TimestampMatch::from_span(line, 0, TS_LEN).unwrap();
        assert_eq!(
            normalizer.normalize(line, Some(&span)),
            "user # from #.#.#.# at 0x# took #.5s"
        );
        assert_eq!(normalizer.normalize("order42 shipped", None), "order42 shipped");
    }

    #[test]
    fn test_find_similar_lines() {
        let lines = [
            "2026-01-01 10:00:00 GET /item/1 200",
            "2026-01-01 10:00:01 cache miss",
            "  continuation 123",
            "2026-01-01 10:00:02 GET /item/2 200",
            "2026-01-01 10:00:03 cache miss",
            "2026-01-01 10:00:04 GET /item/3 404",
            "2026-01-01 10:00:05 GET /item/4 200",
            "2026-01-01 10:00:06 shutdown",
            "2026-99-99 99:99:99 unparseable",
        ];
        let normalizer = LineNormalizer::new().unwrap();
        let result = find_similar_lines(&lines, &matcher(), &normalizer, 2);

        assert_eq!(result.total_analyzed, 7);
        assert_eq!(result.unique_patterns, 3);
        assert_eq!(result.lines.len(), 2);

        let top = &result.lines[0];
        assert_eq!(top.pattern, "GET /item/# #");
        assert_eq!(top.count, 4);
        assert_eq!(top.example, lines[0]);
        assert_eq!(top.first_timestamp.format("%S").to_string(), "00");
        assert_eq!(top.last_timestamp.format("%S").to_string(), "05");

        assert_eq!(result.lines[1].pattern, "cache miss");
        assert_eq!(result.lines[1].count, 2);
    }

    #[test]
    fn test_equal_counts_keep_first_appearance() {
        let lines = [
            "2026-01-01 10:00:00 beta",
            "2026-01-01 10:00:01 alpha",
        ];
        let normalizer = LineNormalizer::new().unwrap();
        let result = find_similar_lines(&lines, &matcher(), &normalizer, 10);
        let patterns: Vec<&str> = result.lines.iter().map(|l| l.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["beta", "alpha"]);
    }
}
