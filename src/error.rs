//! Error types for the prime database engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrimeDbError>;

#[derive(Error, Debug)]
pub enum PrimeDbError {
    #[error("Prime #{n} not found: database holds {len} primes")]
    NotFound { n: u64, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Invalid prime sequence: {0}")]
    InvalidSequence(String),

    #[error("Gap overflow: gap from {prev} to {next} does not fit in 32 bits")]
    GapOverflow { prev: u64, next: u64 },
}

impl PrimeDbError {
    /// Get error code for CLI exit reporting
    pub fn code(&self) -> &'static str {
        match self {
            PrimeDbError::NotFound { .. } => "NOT_FOUND",
            PrimeDbError::InvalidFormat(_) => "INVALID_FORMAT",
            PrimeDbError::InvalidSequence(_) => "INVALID_SEQUENCE",
            PrimeDbError::GapOverflow { .. } => "GAP_OVERFLOW",
            _ => "INTERNAL_ERROR",
        }
    }
}
