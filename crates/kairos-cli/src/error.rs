//! Errors of the command-line clients.

use std::path::PathBuf;

use kairos_core::{CallError, RaceError};
use thiserror::Error;

/// Result type alias using [`CliError`].
pub type CliResult<T> = Result<T, CliError>;

/// Failures of the command-line clients.
#[derive(Debug, Error)]
pub enum CliError {
    /// The postal code does not have the `NNNNN-NNN` or `NNNNNNNN` shape.
    #[error("invalid CEP '{0}': expected 8 digits, optionally as NNNNN-NNN")]
    InvalidCep(String),

    /// No provider returned usable data.
    #[error(transparent)]
    Race(#[from] RaceError),

    /// The quote request failed.
    #[error("failed to fetch quote: {0}")]
    Fetch(#[from] CallError),

    /// The output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
