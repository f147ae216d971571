//! Timing and repetition analysis over segmented records.
//!
//! # Architecture
//!
//! - **gaps**: time between consecutive timestamped records, top-N longest
//! - **stats**: descriptive statistics and IQR outliers over those gaps
//! - **similar**: start lines grouped by a number-free pattern
//!
//! Records without a timestamp are skipped; they neither open nor close a gap.

use thiserror::Error;

pub mod gaps;
pub mod similar;
pub mod stats;

pub use gaps::{extract_all_gaps, find_top_gaps, format_duration, GapRecord, TopGaps};
pub use similar::{find_similar_lines, LineNormalizer, SimilarLine, SimilarLines};
pub use stats::{chunk_stats, detect_outliers, ChunkStats, DescriptiveStats};

/// Gaps reported by [`find_top_gaps`] unless asked otherwise.
pub const DEFAULT_TOP_GAPS: usize = 10;

/// Patterns reported by [`find_similar_lines`] unless asked otherwise.
pub const DEFAULT_TOP_PATTERNS: usize = 20;

/// Standard Tukey fence multiplier; 3.0 keeps only far outliers.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid normalization pattern: {0}")]
    InvalidPattern(String),
}
