//! Leading log-level token skipping.
//!
//! Lines such as `[INFO] 2026-02-05 10:00:00 ...` or `WARN 10:00:00 ...` put
//! the level before the timestamp. Detection and matching look for the
//! timestamp right after that token.

/// Longest prefix examined when sampling a line for detection.
pub(crate) const CANDIDATE_PREFIX_CHARS: usize = 60;

const LEVEL_KEYWORDS: &[&[u8]] = &[
    b"TRACE", b"DEBUG", b"INFO", b"WARN", b"WARNING", b"ERROR",
    b"FATAL", b"SEVERE", b"NOTICE",
];

/// Byte length of a leading level token (with its optional brackets and
/// trailing whitespace), or 0 when the line does not start with one.
pub(crate) fn level_prefix_len(line: &str) -> usize {
    let bytes = line.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    if pos < len && matches!(bytes[pos], b'[' | b'(' | b'<') {
        pos += 1;
    }

    // Longest keyword wins so WARNING is not read as WARN + "ING"
    let level = LEVEL_KEYWORDS
        .iter()
        .filter(|kw| starts_with_ignore_case(&bytes[pos..], kw))
        .max_by_key(|kw| kw.len());
    let Some(level) = level else {
        return 0;
    };
    pos += level.len();

    // Word boundary: "INFORMATION" is not a level token
    if pos < len && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
        return 0;
    }

    if pos < len && matches!(bytes[pos], b']' | b')' | b'>') {
        pos += 1;
    }

    while pos < len && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    pos
}

/// The slice of `line` inspected during detection: level token removed,
/// capped at [`CANDIDATE_PREFIX_CHARS`] characters.
pub(crate) fn candidate_prefix(line: &str) -> &str {
    let rest = &line[level_prefix_len(line)..];
    match rest.char_indices().nth(CANDIDATE_PREFIX_CHARS) {
        Some((cut, _)) => &rest[..cut],
        None => rest,
    }
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_level() {
        let line = "[INFO] 2026-02-05 10:00:00 started";
        assert_eq!(&line[level_prefix_len(line)..], "2026-02-05 10:00:00 started");
    }

    #[test]
    fn test_bare_and_lowercase_level() {
        let line = "  warn 10:00:00 disk";
        assert_eq!(&line[level_prefix_len(line)..], "10:00:00 disk");
    }

    #[test]
    fn test_warning_is_not_split() {
        let line = "<WARNING> 10:00:00 disk";
        assert_eq!(&line[level_prefix_len(line)..], "10:00:00 disk");
    }

    #[test]
    fn test_no_level() {
        assert_eq!(level_prefix_len("2026-02-05 10:00:00 INFO x"), 0);
        assert_eq!(level_prefix_len("INFORMATION follows"), 0);
        assert_eq!(level_prefix_len(""), 0);
    }

    #[test]
    fn test_candidate_prefix_is_capped() {
        let line = format!("ERROR {}", "x".repeat(100));
        assert_eq!(candidate_prefix(&line).len(), CANDIDATE_PREFIX_CHARS);
    }

    #[test]
    fn test_candidate_prefix_multibyte() {
        let line = "é".repeat(80);
        assert_eq!(candidate_prefix(&line).chars().count(), CANDIDATE_PREFIX_CHARS);
    }
}
