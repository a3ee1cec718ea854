//! Error types for the quote service and its store.

use kairos_core::CallError;
use thiserror::Error;

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the exchange-rate store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The database could not be opened.
    #[error("failed to open database: {0}")]
    Connect(String),

    /// The schema could not be created.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A record could not be written or read.
    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Failure of a quote request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// The upstream call produced no usable rate.
    #[error("failed to fetch exchange rate: {0}")]
    Fetch(#[from] CallError),
}
