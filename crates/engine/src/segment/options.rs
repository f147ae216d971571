use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a record's `message` is derived from its first line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageMode {
    /// Remove the timestamp span and surrounding separators
    #[default]
    FirstLineMinusTimestamp,
    /// Keep the first line verbatim
    FirstLineAsIs,
}

impl MessageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageMode::FirstLineMinusTimestamp => "firstLineMinusTimestamp",
            MessageMode::FirstLineAsIs => "firstLineAsIs",
        }
    }
}

impl fmt::Display for MessageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageMode {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firstLineMinusTimestamp" | "first_line_minus_timestamp" | "minus-timestamp" => {
                Ok(MessageMode::FirstLineMinusTimestamp)
            }
            "firstLineAsIs" | "first_line_as_is" | "as-is" => Ok(MessageMode::FirstLineAsIs),
            other => Err(SegmentError::UnknownMessageMode(other.to_string())),
        }
    }
}

/// Tunables for a segmentation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    pub message_mode: MessageMode,
    /// Maximum lines per record, start line included
    pub max_multiline_size: usize,
}

impl SegmentOptions {
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.max_multiline_size == 0 {
            return Err(SegmentError::InvalidMaxMultilineSize);
        }
        Ok(())
    }

    /// Bound used by the pass. A zero bound behaves like 1.
    pub(crate) fn effective_max(&self) -> usize {
        self.max_multiline_size.max(1)
    }
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            message_mode: MessageMode::FirstLineMinusTimestamp,
            max_multiline_size: 1000,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("max_multiline_size must be > 0")]
    InvalidMaxMultilineSize,

    #[error("Unknown message mode: {0} (expected firstLineMinusTimestamp or firstLineAsIs)")]
    UnknownMessageMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SegmentOptions::default();
        assert_eq!(options.message_mode, MessageMode::FirstLineMinusTimestamp);
        assert_eq!(options.max_multiline_size, 1000);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let options = SegmentOptions {
            max_multiline_size: 0,
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(SegmentError::InvalidMaxMultilineSize));
        assert_eq!(options.effective_max(), 1);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let options: SegmentOptions = serde_json::from_str(r#"{"message_mode":"firstLineAsIs"}"#).unwrap();
        assert_eq!(options.message_mode, MessageMode::FirstLineAsIs);
        assert_eq!(options.max_multiline_size, 1000);
    }

    #[test]
    fn test_message_mode_from_str() {
        assert_eq!("as-is".parse::<MessageMode>(), Ok(MessageMode::FirstLineAsIs));
        assert_eq!(
            "firstLineMinusTimestamp".parse::<MessageMode>(),
            Ok(MessageMode::FirstLineMinusTimestamp)
        );
        assert!("sideways".parse::<MessageMode>().is_err());
    }
}
