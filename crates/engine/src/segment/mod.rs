/// Log entry segmentation
///
/// Groups raw log lines into records. Each record starts at a line the
/// timestamp matcher accepts and absorbs the lines after it (stack traces,
/// wrapped output) until the next start line.
///
/// The pass is total: every input produces a record sequence. A missing or
/// unparseable timestamp yields `timestamp: None`, and oversized records
/// are cut with a single marker line.

pub mod engine;
pub mod model;
pub mod options;
mod message;
mod serde_utils;

// Re-export commonly used types
pub use engine::{segment, segment_with_stats, Segmenter};
pub use model::{Record, SegmentStats, TRUNCATION_MARKER};
pub use options::{MessageMode, SegmentError, SegmentOptions};
pub use serde_utils::TIMESTAMP_FORMAT;
