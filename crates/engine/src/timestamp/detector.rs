use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use grep_regex::RegexMatcher;

use super::formats::FormatKind;
use super::matcher::{compile, match_at_start, DetectedFormat};
use super::model::{FileDates, TimestampError, MILLIS_PER_DAY};
use super::prefix::candidate_prefix;
use super::{DEFAULT_SAMPLE_LINES, MIN_PREFIX_DIGITS};

/// Outcome of timestamp format detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub format: Option<DetectedFormat>,
    /// Instants parsed from the sample by the winning format, in sample order
    pub sample_parsed: Vec<DateTime<Utc>>,
    pub lines_scanned: usize,
    /// Share of candidate lines the winning format parsed (0.0 - 1.0)
    pub match_rate: f64,
    /// Earliest and latest instants seen in the sample
    pub file_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl DetectionResult {
    fn none(lines_scanned: usize) -> Self {
        Self {
            format: None,
            sample_parsed: Vec::new(),
            lines_scanned,
            match_rate: 0.0,
            file_range: None,
        }
    }

    pub fn detected(&self) -> bool {
        self.format.is_some()
    }

    /// One-line summary for status output.
    pub fn display(&self) -> String {
        let Some(format) = &self.format else {
            return "No timestamp format detected".to_string();
        };
        let range = self
            .file_range
            .map(|(from, to)| {
                format!(
                    " | range: {} -> {}",
                    from.to_rfc3339_opts(SecondsFormat::Millis, true),
                    to.to_rfc3339_opts(SecondsFormat::Millis, true)
                )
            })
            .unwrap_or_default();
        format!(
            "{} - match: {:.1}%, confidence: {:.3}{}",
            format.pattern(),
            self.match_rate * 100.0,
            format.score(),
            range
        )
    }
}

#[derive(Debug)]
struct FormatScore {
    kind: FormatKind,
    total: f64,
    matches: usize,
    in_range: usize,
    parsed: Vec<DateTime<Utc>>,
}

/// Timestamp format detector.
///
/// 1. Sample non-blank lines evenly across the input
/// 2. Keep prefixes with enough digits to hold a timestamp
/// 3. Score every candidate format against the file date window
/// 4. Rank by in-range hits, then raw hits, then total score
pub struct TimestampDetector {
    candidates: Vec<(FormatKind, RegexMatcher)>,
    max_sample: usize,
}

impl TimestampDetector {
    pub fn new() -> Result<Self, TimestampError> {
        Self::with_sample_size(DEFAULT_SAMPLE_LINES)
    }

    pub fn with_sample_size(max_sample: usize) -> Result<Self, TimestampError> {
        let candidates = FormatKind::ALL
            .iter()
            .map(|kind| Ok((*kind, compile(&kind.regex())?)))
            .collect::<Result<Vec<_>, TimestampError>>()?;

        Ok(Self {
            candidates,
            max_sample: max_sample.max(1),
        })
    }

    pub fn detect<S: AsRef<str>>(&self, lines: &[S], dates: FileDates) -> DetectionResult {
        let sample = self.sample_indices(lines);
        let lines_scanned = sample.len();

        let prefixes: Vec<&str> = sample
            .iter()
            .map(|&i| candidate_prefix(lines[i].as_ref()))
            .filter(|prefix| count_digits(prefix) >= MIN_PREFIX_DIGITS)
            .collect();

        if prefixes.is_empty() {
            tracing::debug!(lines_scanned, "timestamp detection: no candidate lines");
            return DetectionResult::none(lines_scanned);
        }

        let mut scores: Vec<FormatScore> = self
            .candidates
            .iter()
            .map(|(kind, matcher)| score_format(*kind, matcher, &prefixes, &dates))
            .collect();

        // Stable sort: earlier candidates win exact ties
        scores.sort_by(|a, b| {
            b.in_range
                .cmp(&a.in_range)
                .then(b.matches.cmp(&a.matches))
                .then(b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal))
        });

        let best = scores.swap_remove(0);
        if best.matches == 0 {
            tracing::debug!(lines_scanned, "timestamp detection: no format matched");
            return DetectionResult::none(lines_scanned);
        }

        let match_rate = best.matches as f64 / prefixes.len() as f64;
        let in_range_rate = best.in_range as f64 / best.matches.max(1) as f64;
        let mono = monotonic_ratio(&best.parsed);
        let span = span_score(&best.parsed, &dates);
        let confidence = best.total
            * match_rate
            * (0.3 + 0.35 * mono + 0.35 * in_range_rate)
            * (0.7 + 0.3 * span);

        let file_range = best
            .parsed
            .iter()
            .min()
            .zip(best.parsed.iter().max())
            .map(|(from, to)| (*from, *to));

        let Some(matcher) = self
            .candidates
            .iter()
            .find(|(kind, _)| *kind == best.kind)
            .map(|(_, m)| m.clone())
        else {
            return DetectionResult::none(lines_scanned);
        };

        tracing::debug!(
            pattern = best.kind.pattern(),
            matches = best.matches,
            in_range = best.in_range,
            confidence,
            "timestamp detection: format selected"
        );

        DetectionResult {
            format: Some(DetectedFormat::from_parts(best.kind, matcher, dates, confidence)),
            sample_parsed: best.parsed,
            lines_scanned,
            match_rate,
            file_range,
        }
    }

    fn sample_indices<S: AsRef<str>>(&self, lines: &[S]) -> Vec<usize> {
        let step = (lines.len() / self.max_sample).max(1);
        (0..lines.len())
            .step_by(step)
            .filter(|&i| !lines[i].as_ref().trim().is_empty())
            .take(self.max_sample)
            .collect()
    }
}

fn score_format(kind: FormatKind, matcher: &RegexMatcher, prefixes: &[&str], dates: &FileDates) -> FormatScore {
    let mut score = FormatScore {
        kind,
        total: 0.0,
        matches: 0,
        in_range: 0,
        parsed: Vec::new(),
    };

    for prefix in prefixes {
        let Some((start, end)) = match_at_start(matcher, prefix, 0) else {
            continue;
        };
        if !kind.accepts_boundary(prefix, end) {
            continue;
        }
        let Some(instant) = kind.parse(&prefix[start..end], dates) else {
            continue;
        };

        let s = dates.score(instant);
        if s > 0.0 {
            score.total += s;
            score.matches += 1;
            if s >= 1.0 {
                score.in_range += 1;
            }
            score.parsed.push(instant);
        }
    }

    score
}

fn count_digits(s: &str) -> usize {
    s.bytes().filter(u8::is_ascii_digit).count()
}

/// Share of consecutive pairs that do not go backwards in time.
fn monotonic_ratio(parsed: &[DateTime<Utc>]) -> f64 {
    if parsed.len() < 2 {
        return 1.0;
    }
    let rising = parsed.windows(2).filter(|w| w[1] >= w[0]).count();
    rising as f64 / (parsed.len() - 1) as f64
}

/// How closely the first and last sampled instants line up with file
/// creation and modification.
fn span_score(parsed: &[DateTime<Utc>], dates: &FileDates) -> f64 {
    let (Some(first), Some(last)) = (parsed.first(), parsed.last()) else {
        return 0.0;
    };
    let start_days = (*first - dates.created_at).num_milliseconds().abs() as f64 / MILLIS_PER_DAY;
    let end_days = (*last - dates.modified_at).num_milliseconds().abs() as f64 / MILLIS_PER_DAY;
    (1.0 / (1.0 + start_days) + 1.0 / (1.0 + end_days)) / 2.0
}
