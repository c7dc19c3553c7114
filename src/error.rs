//! Error types for rageval

use thiserror::Error;

/// Main error type for the evaluation engine
#[derive(Error, Debug)]
pub enum EvalError {
    /// Caller misuse: zero cutoff, recall against an empty relevant set, no cutoffs
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Cross-query mean requested over zero contributing queries
    #[error("No queries contributed to {0}")]
    EmptyAggregate(String),

    /// Solution query without a matching prediction entry
    #[error("No prediction for query: {0}")]
    MissingPrediction(String),

    /// Invalid input (bad path, unknown metric name, malformed cutoff list)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EvalError>;
