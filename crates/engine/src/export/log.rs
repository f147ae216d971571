use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use serde_json::{Map, Value};

use super::ExportError;

/// Lines inspected by [`detect_fields`] by default.
pub const FIELD_SAMPLE_LINES: usize = 50;

pub const TIMESTAMP_CANDIDATES: &[&str] = &[
    "timestamp", "time", "ts", "@timestamp", "datetime", "date", "created_at", "logged_at",
];
pub const LEVEL_CANDIDATES: &[&str] = &["level", "severity", "log_level", "loglevel", "lvl", "type"];
pub const MESSAGE_CANDIDATES: &[&str] = &["message", "msg", "text", "body", "description", "error", "log"];

/// Next line with invalid UTF-8 replaced and the line ending removed.
fn read_lossy_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Collect object keys from the first `max_lines` lines, most frequent
/// first, ties by name. Blank and non-JSON lines are skipped.
pub fn detect_fields<R: BufRead>(mut reader: R, max_lines: usize) -> Result<Vec<String>, ExportError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut buf = Vec::new();
    let mut seen = 0;

    while seen < max_lines {
        let Some(line) = read_lossy_line(&mut reader, &mut buf)? else {
            break;
        };
        seen += 1;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&line) {
            for key in obj.keys() {
                *counts.entry(key.clone()).or_insert(0) += 1;
            }
        }
    }

    let mut fields: Vec<(String, usize)> = counts.into_iter().collect();
    fields.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(fields.into_iter().map(|(k, _)| k).collect())
}

/// First candidate present in `fields`.
pub fn pick_best(fields: &[String], candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|c| fields.iter().any(|f| f == *c))
        .map(|c| c.to_string())
}

/// Which JSON fields make up a plain log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogLineLayout {
    pub timestamp: Option<String>,
    pub level: Option<String>,
    pub message: Option<String>,
    /// Appended as `name=value`
    pub extras: Vec<String>,
}

impl LogLineLayout {
    /// Default layout from the best candidate of each kind.
    pub fn suggest(fields: &[String]) -> Self {
        Self {
            timestamp: pick_best(fields, TIMESTAMP_CANDIDATES),
            level: pick_best(fields, LEVEL_CANDIDATES),
            message: pick_best(fields, MESSAGE_CANDIDATES),
            extras: Vec::new(),
        }
    }

    /// Fields not used by the timestamp, level or message slots.
    pub fn unused<'a>(&self, fields: &'a [String]) -> Vec<&'a str> {
        let used = [&self.timestamp, &self.level, &self.message];
        fields
            .iter()
            .filter(|f| !used.iter().any(|u| u.as_deref() == Some(f.as_str())))
            .map(String::as_str)
            .collect()
    }

    /// Render `ts [LEVEL] message extra=value...`. Missing fields are left out.
    pub fn format_line(&self, obj: &Map<String, Value>) -> String {
        let mut parts = Vec::new();

        if let Some(value) = self.timestamp.as_ref().and_then(|f| obj.get(f)) {
            parts.push(value_to_text(value));
        }
        if let Some(value) = self.level.as_ref().and_then(|f| obj.get(f)) {
            parts.push(format!("[{}]", value_to_text(value).to_uppercase()));
        }
        if let Some(value) = self.message.as_ref().and_then(|f| obj.get(f)) {
            parts.push(value_to_text(value));
        }
        for field in &self.extras {
            if let Some(value) = obj.get(field) {
                parts.push(format!("{}={}", field, value_to_text(value)));
            }
        }

        parts.join(" ")
    }
}

/// Strings unquoted, everything else as compact JSON.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Counters from a JSONL to log conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub lines_written: usize,
    /// Lines that were not JSON objects and were copied unchanged
    pub lines_skipped: usize,
}

/// Convert JSONL to plain log lines. Blank lines are dropped and lines
/// that are not JSON objects pass through unchanged. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn convert_jsonl_to_log<R, W>(mut reader: R, writer: &mut W, layout: &LogLineLayout) -> Result<ConversionStats, ExportError>
where
    R: BufRead,
    W: Write,
{
    let mut stats = ConversionStats::default();
    let mut buf = Vec::new();

    while let Some(line) = read_lossy_line(&mut reader, &mut buf)? {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(obj)) => {
                writeln!(writer, "{}", layout.format_line(&obj))?;
                stats.lines_written += 1;
            }
            _ => {
                writeln!(writer, "{}", line)?;
                stats.lines_skipped += 1;
            }
        }
    }
    writer.flush()?;

    tracing::debug!(
        written = stats.lines_written,
        skipped = stats.lines_skipped,
        "export: jsonl converted to log"
    );
    Ok(stats)
}
