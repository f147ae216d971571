use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::LensError;

/// Grouping category of a lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensCategory {
    Level,
    Sql,
    Stack,
    Config,
    Http,
    Retry,
    Custom,
}

impl LensCategory {
    /// Infer a category from a well-known pattern key.
    pub fn infer(key: &str) -> Self {
        const LEVEL_KEYS: &[&str] = &["error", "warn", "warning", "info", "debug", "trace", "fatal", "critical"];

        let lower = key.to_lowercase();
        let has = |needle: &str| lower.contains(needle);

        if LEVEL_KEYS.iter().any(|k| has(k)) {
            LensCategory::Level
        } else if has("sql") || has("query") {
            LensCategory::Sql
        } else if has("stack") || has("exception") {
            LensCategory::Stack
        } else if has("config") {
            LensCategory::Config
        } else if has("http") || has("request") || has("response") {
            LensCategory::Http
        } else if has("retry") {
            LensCategory::Retry
        } else {
            LensCategory::Custom
        }
    }

    /// Palette colour used when a pattern sets none.
    pub fn default_color(&self) -> &'static str {
        match self {
            LensCategory::Level => "#8888ff",
            LensCategory::Sql => "#d48806",
            LensCategory::Stack => "#cf1322",
            LensCategory::Config => "#08979c",
            LensCategory::Http => "#389e0d",
            LensCategory::Retry => "#c41d7f",
            LensCategory::Custom => "#597ef7",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LensCategory::Level => "level",
            LensCategory::Sql => "sql",
            LensCategory::Stack => "stack",
            LensCategory::Config => "config",
            LensCategory::Http => "http",
            LensCategory::Retry => "retry",
            LensCategory::Custom => "custom",
        }
    }
}

impl fmt::Display for LensCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a pattern file, as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPattern {
    pub regexp: String,
    #[serde(default)]
    pub regexpoptions: String,
    #[serde(rename = "bSearch")]
    pub b_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_category: Option<LensCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_show_in_status_bar: Option<bool>,
}

/// Pattern file root: `{"logPatterns": {key: pattern}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPatternsFile {
    pub log_patterns: BTreeMap<String, LogPattern>,
}

/// A searchable pattern with every lens default resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LensEntry {
    pub key: String,
    pub regexp: String,
    pub flags: String,
    pub enabled: bool,
    pub category: LensCategory,
    pub label: String,
    pub color: String,
    pub priority: i64,
    pub show_in_status_bar: bool,
}

impl LensEntry {
    fn resolve(key: String, pattern: LogPattern) -> Self {
        let category = pattern.lens_category.unwrap_or_else(|| LensCategory::infer(&key));
        Self {
            label: pattern.lens_label.unwrap_or_else(|| key.clone()),
            color: pattern
                .lens_color
                .unwrap_or_else(|| category.default_color().to_string()),
            enabled: pattern.lens_enabled.unwrap_or(true),
            priority: pattern.lens_priority.unwrap_or(0),
            show_in_status_bar: pattern.lens_show_in_status_bar.unwrap_or(true),
            regexp: pattern.regexp,
            flags: pattern.regexpoptions,
            category,
            key,
        }
    }
}

impl LogPatternsFile {
    pub fn from_json(json: &str) -> Result<Self, LensError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Searchable entries (`bSearch = true`) with defaults applied,
    /// highest priority first. Equal priorities keep key order.
    pub fn into_entries(self) -> Vec<LensEntry> {
        let mut entries: Vec<LensEntry> = self
            .log_patterns
            .into_iter()
            .filter(|(_, pattern)| pattern.b_search)
            .map(|(key, pattern)| LensEntry::resolve(key, pattern))
            .collect();
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        entries
    }

    /// Starter set of level lenses.
    pub fn starter() -> Self {
        let level = |regexp: &str, label: &str, color: &str, priority: i64| LogPattern {
            regexp: regexp.to_string(),
            regexpoptions: "ig".to_string(),
            b_search: true,
            lens_enabled: Some(true),
            lens_category: Some(LensCategory::Level),
            lens_label: Some(label.to_string()),
            lens_color: Some(color.to_string()),
            lens_priority: Some(priority),
            lens_show_in_status_bar: Some(true),
        };

        let mut log_patterns = BTreeMap::new();
        log_patterns.insert("error".to_string(), level("ERROR", "Error", "#ff4d4f", 100));
        log_patterns.insert("warn".to_string(), level("WARN", "Warning", "#faad14", 90));
        log_patterns.insert("info".to_string(), level("INFO", "Info", "#40a9ff", 80));
        Self { log_patterns }
    }
}

/// Read and resolve a pattern file.
pub fn read_lens_patterns(path: &Path) -> Result<Vec<LensEntry>, LensError> {
    if !path.exists() {
        return Err(LensError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let entries = LogPatternsFile::from_json(&content)?.into_entries();
    tracing::debug!(path = %path.display(), entries = entries.len(), "lens: patterns loaded");
    Ok(entries)
}

/// Write the starter pattern file unless one already exists.
/// Returns false when the file was left untouched.
pub fn write_starter_patterns(path: &Path) -> Result<bool, LensError> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&LogPatternsFile::starter())?;
    std::fs::write(path, json)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD: &str = r##"{
        "logPatterns": {
            "error": {"regexp": "ERROR", "regexpoptions": "i", "bSearch": true,
                      "lensCategory": "level", "lensLabel": "Error", "lensColor": "#ff4d4f", "lensPriority": 100},
            "warn":  {"regexp": "WARN", "regexpoptions": "i", "bSearch": true, "lensPriority": 90},
            "sqlQuery": {"regexp": "SELECT", "regexpoptions": "", "bSearch": true},
            "hidden": {"regexp": "x", "regexpoptions": "", "bSearch": false}
        }
    }"##;

    #[test]
    fn test_drops_non_search_entries() {
        let entries = LogPatternsFile::from_json(STANDARD).unwrap().into_entries();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.key != "hidden"));
    }

    #[test]
    fn test_sorted_by_priority() {
        let entries = LogPatternsFile::from_json(STANDARD).unwrap().into_entries();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["error", "warn", "sqlQuery"]);
    }

    #[test]
    fn test_defaults_applied() {
        let entries = LogPatternsFile::from_json(STANDARD).unwrap().into_entries();
        let warn = entries.iter().find(|e| e.key == "warn").unwrap();
        assert_eq!(warn.label, "warn");
        assert_eq!(warn.category, LensCategory::Level);
        assert_eq!(warn.color, "#8888ff");
        assert!(warn.enabled);
        assert!(warn.show_in_status_bar);

        let sql = entries.iter().find(|e| e.key == "sqlQuery").unwrap();
        assert_eq!(sql.category, LensCategory::Sql);
        assert_eq!(sql.color, "#d48806");
        assert_eq!(sql.priority, 0);
    }

    #[test]
    fn test_explicit_values_win() {
        let entries = LogPatternsFile::from_json(STANDARD).unwrap().into_entries();
        let error = &entries[0];
        assert_eq!(error.label, "Error");
        assert_eq!(error.color, "#ff4d4f");
        assert_eq!(error.flags, "i");
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(LensCategory::infer("FatalErrors"), LensCategory::Level);
        assert_eq!(LensCategory::infer("slow_query"), LensCategory::Sql);
        assert_eq!(LensCategory::infer("NullPointerException"), LensCategory::Stack);
        assert_eq!(LensCategory::infer("configReload"), LensCategory::Config);
        assert_eq!(LensCategory::infer("httpRequest"), LensCategory::Http);
        assert_eq!(LensCategory::infer("retries"), LensCategory::Custom);
        assert_eq!(LensCategory::infer("retry_loop"), LensCategory::Retry);
        assert_eq!(LensCategory::infer("users"), LensCategory::Custom);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(LogPatternsFile::from_json("{not json"), Err(LensError::Json(_))));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(read_lens_patterns(&missing), Err(LensError::NotFound(_))));
    }

    #[test]
    fn test_starter_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".logseg").join("logPatterns.json");

        assert!(write_starter_patterns(&path).unwrap());
        assert!(!write_starter_patterns(&path).unwrap());

        let entries = read_lens_patterns(&path).unwrap();
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Error", "Warning", "Info"]);
    }
}
