//! Error types for the chain engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error persisting chain state: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error persisting chain state: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed stored hash: {0}")]
    BadHash(#[from] ember_core::hash::HashParseError),

    #[error("persisted metadata references unknown block hash {0}")]
    DanglingMetadata(String),

    #[error("persisted block {0} does not hash-check against its stored fields")]
    ChecksumMismatch(String),
}
