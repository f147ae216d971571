/// Timestamp recognition
///
/// Decides which lines open a record and turns their leading timestamp into
/// a UTC instant.
///
/// # Architecture
///
/// - `traits.rs`: `StartLineMatcher`, the contract the segmenter consumes
/// - `formats.rs`: candidate formats with their regexes and parsers
/// - `detector.rs`: sampling detector that ranks formats against file dates
/// - `matcher.rs`: detected and user-configured matchers
/// - `prefix.rs`: level-token skipping shared by detection and matching

pub mod traits;
pub mod detector;
pub mod formats;
pub mod matcher;
pub mod model;
mod prefix;

// Re-export commonly used types
pub use traits::{FnMatcher, NoTimestamps, StartLineMatcher};
pub use detector::{DetectionResult, TimestampDetector};
pub use formats::FormatKind;
pub use matcher::{CustomFormat, DetectedFormat};
pub use model::{FileDates, LineClass, TimestampError, TimestampMatch};

// Constants
pub const DEFAULT_SAMPLE_LINES: usize = 100;
/// Prefixes with fewer digits than this cannot hold a full timestamp
pub const MIN_PREFIX_DIGITS: usize = 6;
