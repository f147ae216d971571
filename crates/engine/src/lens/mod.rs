//! Lenses: named regex highlights counted over the visible part of a log.

use std::path::PathBuf;

use thiserror::Error;

pub mod engine;
pub mod pattern;

pub use engine::{visible_line_numbers, LensEngine, LensMatch, LensReport, LensResult, StatusItem};
pub use pattern::{read_lens_patterns, write_starter_patterns, LensCategory, LensEntry, LogPattern, LogPatternsFile};

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Invalid lens regex: {0}")]
    InvalidRegex(String),

    #[error("Unsupported regex flag: '{0}'")]
    UnsupportedFlag(char),

    #[error("Pattern file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read pattern file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern file: {0}")]
    Json(#[from] serde_json::Error),
}
