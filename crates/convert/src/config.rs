use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine::timestamp::{CustomFormat, TimestampError, DEFAULT_SAMPLE_LINES};
use engine::SegmentOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertConfig {
    /// Log to JSONL segmentation options
    #[serde(default)]
    pub jsonl: SegmentOptions,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub lens: LensConfig,
    pub logging: LoggingConfig,
}

/// Timestamp detection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Lines sampled when detecting the timestamp format
    pub sample_lines: usize,
    /// Regex used when no format is detected
    pub fallback_regex: Option<String>,
    /// chrono format string for text matched by `fallback_regex`
    pub fallback_format: Option<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_lines: DEFAULT_SAMPLE_LINES,
            fallback_regex: None,
            fallback_format: None,
        }
    }
}

impl DetectionConfig {
    /// Build the configured fallback matcher, if any.
    pub fn fallback_matcher(&self) -> Result<Option<CustomFormat>, TimestampError> {
        self.fallback_regex
            .as_deref()
            .map(|regex| CustomFormat::new(regex, self.fallback_format.as_deref()))
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LensConfig {
    pub enabled: bool,
    /// Pattern file; the starter level lenses are used when unset
    pub patterns_file: Option<PathBuf>,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl ConvertConfig {
    /// Load configuration from convert.toml and environment variables.
    /// `explicit` is layered after the default locations.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&ConvertConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        // 1. /etc/logseg/convert.toml (system-wide)
        // 2. config/convert.toml (working directory)
        for path in ["/etc/logseg/convert", "config/convert"] {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Single underscore after the prefix, double underscore for nested
        // keys: LOGSEG_JSONL__MAX_MULTILINE_SIZE
        builder = builder.add_source(
            config::Environment::with_prefix("LOGSEG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.jsonl.validate().context("Invalid jsonl section")?;

        if self.detection.sample_lines == 0 {
            anyhow::bail!("detection.sample_lines must be > 0");
        }
        if self.detection.fallback_format.is_some() && self.detection.fallback_regex.is_none() {
            anyhow::bail!("detection.fallback_format requires detection.fallback_regex");
        }
        self.detection
            .fallback_matcher()
            .context("Invalid detection fallback")?;

        Ok(())
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            jsonl: SegmentOptions::default(),
            detection: DetectionConfig::default(),
            lens: LensConfig::default(),
            logging: LoggingConfig {
                level: "warn,convert=info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}
