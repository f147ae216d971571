use thiserror::Error;

/// Outcomes the user has to act on. Everything else is an `anyhow` error
/// with context.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("No timestamp format detected in {0}; rerun with --yes to convert anyway (results may be a single entry)")]
    NoTimestampFormat(String),

    #[error("{0} produced no entries. Is it empty?")]
    NoEntries(String),

    #[error("No JSON object keys detected in {0}. Is this a valid JSONL file?")]
    NoFields(String),

    #[error("{0} already exists (use --force to overwrite)")]
    OutputExists(String),
}

// Convenience type alias
pub type ConvertResult<T> = Result<T, ConvertError>;
