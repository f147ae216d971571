use std::sync::atomic::{AtomicU64, Ordering};

use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

use super::pattern::{LensCategory, LensEntry};
use super::LensError;

/// One match of a lens inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LensMatch {
    pub line: usize,
    /// Byte offsets into the line
    pub start: usize,
    pub end: usize,
}

/// Matches of one lens over the visible lines.
#[derive(Debug, Clone)]
pub struct LensResult {
    pub key: String,
    pub label: String,
    pub category: LensCategory,
    pub color: String,
    pub show_in_status_bar: bool,
    pub ranges: Vec<LensMatch>,
}

impl LensResult {
    pub fn count(&self) -> usize {
        self.ranges.len()
    }
}

/// Status-bar line item: label, colour and visible match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusItem {
    pub label: String,
    pub color: String,
    pub count: usize,
}

/// Results of one decoration pass, in lens priority order.
#[derive(Debug, Clone, Default)]
pub struct LensReport {
    pub results: Vec<LensResult>,
}

impl LensReport {
    pub fn get(&self, key: &str) -> Option<&LensResult> {
        self.results.iter().find(|r| r.key == key)
    }

    pub fn count(&self, key: &str) -> usize {
        self.get(key).map_or(0, LensResult::count)
    }

    pub fn status_items(&self) -> Vec<StatusItem> {
        self.results
            .iter()
            .filter(|r| r.show_in_status_bar)
            .map(|r| StatusItem {
                label: r.label.clone(),
                color: r.color.clone(),
                count: r.count(),
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct LensStats {
    pub lines_scanned: AtomicU64,
    pub matches_found: AtomicU64,
    pub passes: AtomicU64,
}

struct CompiledLens {
    entry: LensEntry,
    /// `None` when the regex failed to compile; the lens reports no matches
    matcher: Option<RegexMatcher>,
}

/// Viewport decoration engine.
///
/// Each enabled lens is compiled once. A pass searches every visible line
/// from its start with no state carried between lines.
pub struct LensEngine {
    lenses: Vec<CompiledLens>,
    stats: LensStats,
}

impl LensEngine {
    pub fn new(entries: Vec<LensEntry>) -> Self {
        let lenses = entries
            .into_iter()
            .filter(|entry| entry.enabled)
            .map(|entry| {
                let matcher = match compile_lens(&entry.regexp, &entry.flags) {
                    Ok(m) => Some(m),
                    Err(e) => {
                        tracing::warn!(key = %entry.key, error = %e, "lens: pattern disabled");
                        None
                    }
                };
                CompiledLens { entry, matcher }
            })
            .collect();

        Self {
            lenses,
            stats: LensStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.lenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lenses.is_empty()
    }

    /// Run every lens over `visible`, given as `(line_number, text)` pairs.
    pub fn apply<S: AsRef<str>>(&self, visible: &[(usize, S)]) -> LensReport {
        self.stats.passes.fetch_add(1, Ordering::Relaxed);
        self.stats.lines_scanned.fetch_add(visible.len() as u64, Ordering::Relaxed);

        let results = self
            .lenses
            .iter()
            .map(|lens| {
                let ranges = match &lens.matcher {
                    Some(matcher) => visible
                        .iter()
                        .flat_map(|(line, text)| find_all(matcher, *line, text.as_ref()))
                        .collect(),
                    None => Vec::new(),
                };
                LensResult {
                    key: lens.entry.key.clone(),
                    label: lens.entry.label.clone(),
                    category: lens.entry.category,
                    color: lens.entry.color.clone(),
                    show_in_status_bar: lens.entry.show_in_status_bar,
                    ranges,
                }
            })
            .collect::<Vec<_>>();

        let total: usize = results.iter().map(LensResult::count).sum();
        self.stats.matches_found.fetch_add(total as u64, Ordering::Relaxed);
        tracing::trace!(lenses = results.len(), lines = visible.len(), matches = total, "lens: pass complete");

        LensReport { results }
    }

    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.stats.lines_scanned.load(Ordering::Relaxed),
            self.stats.matches_found.load(Ordering::Relaxed),
            self.stats.passes.load(Ordering::Relaxed),
        )
    }
}

/// Compile a lens regex with its flag string.
fn compile_lens(pattern: &str, flags: &str) -> Result<RegexMatcher, LensError> {
    let mut builder = RegexMatcherBuilder::new();
    builder.multi_line(false);

    for flag in flags.chars() {
        match flag {
            'g' | 'y' | 'u' => {}
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            other => return Err(LensError::UnsupportedFlag(other)),
        }
    }

    builder
        .build(pattern)
        .map_err(|e| LensError::InvalidRegex(e.to_string()))
}

/// All non-overlapping matches in one line. A zero-width match moves the
/// cursor forward by one character.
fn find_all(matcher: &RegexMatcher, line: usize, text: &str) -> Vec<LensMatch> {
    let mut found = Vec::new();
    let mut at = 0;

    while at <= text.len() {
        let Ok(Some(m)) = matcher.find_at(text.as_bytes(), at) else {
            break;
        };
        found.push(LensMatch {
            line,
            start: m.start(),
            end: m.end(),
        });

        at = if m.end() > m.start() {
            m.end()
        } else {
            match text[m.end()..].chars().next() {
                Some(c) => m.end() + c.len_utf8(),
                None => break,
            }
        };
    }

    found
}

/// Flatten inclusive `(first, last)` line ranges into line numbers, clamped
/// to a document of `line_count` lines.
pub fn visible_line_numbers(ranges: &[(usize, usize)], line_count: usize) -> Vec<usize> {
    let Some(last_line) = line_count.checked_sub(1) else {
        return Vec::new();
    };
    ranges
        .iter()
        .filter(|(start, _)| *start <= last_line)
        .flat_map(|&(start, end)| start..=end.min(last_line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, regexp: &str, flags: &str) -> LensEntry {
        LensEntry {
            key: key.to_string(),
            regexp: regexp.to_string(),
            flags: flags.to_string(),
            enabled: true,
            category: LensCategory::infer(key),
            label: key.to_uppercase(),
            color: "#000000".to_string(),
            priority: 0,
            show_in_status_bar: true,
        }
    }

    fn visible(lines: &[&str]) -> Vec<(usize, String)> {
        lines.iter().enumerate().map(|(i, l)| (i, l.to_string())).collect()
    }

    #[test]
    fn test_counts_matches_per_lens() {
        let engine = LensEngine::new(vec![entry("error", "ERROR", "ig"), entry("warn", "WARN", "g")]);
        let report = engine.apply(&visible(&["ERROR a error b", "warn c", "WARN d"]));

        assert_eq!(report.count("error"), 2);
        assert_eq!(report.count("warn"), 1);
        assert_eq!(
            report.get("error").unwrap().ranges[1],
            LensMatch { line: 0, start: 8, end: 13 }
        );
    }

    #[test]
    fn test_no_state_between_lines() {
        let engine = LensEngine::new(vec![entry("start", "^x", "g")]);
        let report = engine.apply(&visible(&["x1", "x2", "yx"]));
        assert_eq!(report.count("start"), 2);
    }

    #[test]
    fn test_zero_width_terminates() {
        let engine = LensEngine::new(vec![entry("empty", "", "g"), entry("boundary", r"\b", "g")]);
        let report = engine.apply(&visible(&["abc", "", "é!"]));

        // One empty match per char position plus the end of line
        assert_eq!(report.count("empty"), 4 + 1 + 3);
        assert_eq!(report.count("boundary"), 2 + 2);
    }

    #[test]
    fn test_flags() {
        let engine = LensEngine::new(vec![entry("ci", "error", "i"), entry("cs", "error", "")]);
        let report = engine.apply(&visible(&["ERROR"]));
        assert_eq!(report.count("ci"), 1);
        assert_eq!(report.count("cs"), 0);
    }

    #[test]
    fn test_bad_lens_reports_zero() {
        let engine = LensEngine::new(vec![
            entry("broken", "[unclosed", "g"),
            entry("weird", "x", "q"),
            entry("ok", "x", "g"),
        ]);
        let report = engine.apply(&visible(&["x"]));
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.count("broken"), 0);
        assert_eq!(report.count("weird"), 0);
        assert_eq!(report.count("ok"), 1);
    }

    #[test]
    fn test_disabled_lenses_skipped() {
        let mut disabled = entry("off", "x", "");
        disabled.enabled = false;
        let engine = LensEngine::new(vec![disabled, entry("on", "x", "")]);
        assert_eq!(engine.len(), 1);
        assert!(engine.apply(&visible(&["x"])).get("off").is_none());
    }

    #[test]
    fn test_status_items_filtered() {
        let mut quiet = entry("quiet", "x", "");
        quiet.show_in_status_bar = false;
        let engine = LensEngine::new(vec![entry("loud", "x", ""), quiet]);
        let items = engine.apply(&visible(&["x x"])).status_items();
        assert_eq!(
            items,
            vec![StatusItem {
                label: "LOUD".to_string(),
                color: "#000000".to_string(),
                count: 2,
            }]
        );
    }

    #[test]
    fn test_compile_lens_errors() {
        assert!(matches!(compile_lens("x", "gz"), Err(LensError::UnsupportedFlag('z'))));
        assert!(matches!(compile_lens("(", ""), Err(LensError::InvalidRegex(_))));
        assert!(compile_lens("x", "gimsuy").is_ok());
    }

    #[test]
    fn test_visible_line_numbers() {
        assert_eq!(visible_line_numbers(&[(0, 2), (5, 6)], 10), vec![0, 1, 2, 5, 6]);
        assert_eq!(visible_line_numbers(&[(3, 20)], 5), vec![3, 4]);
        assert_eq!(visible_line_numbers(&[(7, 9)], 5), Vec::<usize>::new());
        assert!(visible_line_numbers(&[(0, 3)], 0).is_empty());
    }

    #[test]
    fn test_stats_tracking() {
        let engine = LensEngine::new(vec![entry("x", "x", "g")]);
        engine.apply(&visible(&["x", "xx"]));
        engine.apply(&visible(&["y"]));
        assert_eq!(engine.stats(), (3, 3, 2));
    }
}
