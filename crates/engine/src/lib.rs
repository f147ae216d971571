// Domain-driven module structure for the log segmentation engine.

// Core
pub mod segment;
pub mod timestamp;

// Collaborators
pub mod analysis;
pub mod lens;
pub mod export;

pub use segment::{segment, segment_with_stats, MessageMode, Record, SegmentOptions, Segmenter};
pub use timestamp::{FileDates, StartLineMatcher, TimestampDetector};
