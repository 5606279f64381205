//! Error types for timing records and reports

use thiserror::Error;

/// Errors that can occur while building or printing a timing report
#[derive(Error, Debug)]
pub enum TimedError {
    /// A buffer line could not be parsed as a timing event.
    ///
    /// `line` is 1-based. The whole report fails; no rows are skipped.
    #[error("Malformed timing record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A raw line handed to the recorder contains a line break and would
    /// read back as more than one record.
    #[error("Timing record must be a single line: {0:?}")]
    MultiLineRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for timing operations
pub type Result<T> = std::result::Result<T, TimedError>;
