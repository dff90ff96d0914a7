use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("input is not valid UTF-8 (first invalid byte at offset {offset})")]
    Encoding { offset: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    #[error("document {ordinal} is {size} bytes, over the {limit} byte limit")]
    DocumentTooLarge {
        ordinal: usize,
        size: usize,
        limit: usize,
    },
}

pub type Result<T> = std::result::Result<T, SegmentError>;

/// Conditions repaired in place while parsing. They travel with the output
/// instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A code fence was still open at the end of its entry and was closed
    /// implicitly. `line` is the zero-based line of the opening fence,
    /// counted from the start of the source document.
    MalformedFence { entry: usize, line: usize },
    /// The document held no entries once whitespace was set aside.
    EmptySourceDocument,
}
