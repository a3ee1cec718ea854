//! # Kairos CLI
//!
//! Library half of the Kairos command-line clients.
//!
//! - [`cep`] - Races two postal-code providers and keeps the fastest answer
//! - [`quote`] - Fetches the current bid from a Kairos server and appends it to a file

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cep;
mod error;
pub mod quote;

pub use error::{CliError, CliResult};
