//! Error types for HTLC analysis

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("No matching template: {0}")]
    NoMatchingTemplate(String),

    #[error("Ambiguous timestamp: {0}")]
    AmbiguousTimestamp(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Errors that only drop the current record; everything else aborts the batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalysisError::NoMatchingTemplate(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
