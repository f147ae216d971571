use crate::timestamp::TimestampMatch;

use super::options::MessageMode;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '|' | ':')
}

/// Derive a record message from its start line.
///
/// The timestamp span is cut out by position, so a second textual copy of
/// the timestamp elsewhere in the line survives. The result falls back to
/// the whole line when nothing but separators is left.
pub(crate) fn build_message(line: &str, span: Option<&TimestampMatch>, mode: MessageMode) -> String {
    if mode == MessageMode::FirstLineAsIs {
        return line.to_string();
    }

    let Some(span) = span else {
        return line.to_string();
    };

    let (Some(before), Some(after)) = (line.get(..span.start), line.get(span.end..)) else {
        return line.to_string();
    };
    if span.start > span.end {
        return line.to_string();
    }

    let mut stripped = String::with_capacity(before.len() + after.len());
    stripped.push_str(before);
    stripped.push_str(after);

    let trimmed = stripped.trim_matches(is_separator);
    if trimmed.is_empty() {
        line.to_string()
    } else {
        trimmed.to_string()
    }
}
