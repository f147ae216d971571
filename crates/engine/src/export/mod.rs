//! Record and log serialization.
//!
//! - `jsonl.rs`: records to newline-delimited JSON
//! - `log.rs`: JSONL back to plain log lines with field detection

use thiserror::Error;

pub mod jsonl;
pub mod log;

pub use jsonl::write_jsonl;
pub use log::{convert_jsonl_to_log, detect_fields, pick_best, ConversionStats, LogLineLayout, FIELD_SAMPLE_LINES};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
