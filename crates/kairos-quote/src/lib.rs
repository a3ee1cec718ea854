//! # Kairos Quote
//!
//! Exchange-rate service: fetch the current rate under a short budget, then
//! persist it under a separate, shorter one.
//!
//! - [`ExchangeRate`] - The quotation record and its string-encoded wire format
//! - [`ExchangeStore`] - Persistence port ([`SqliteExchangeStore`], [`MemoryExchangeStore`])
//! - [`QuoteService`] - Fetch-then-persist over a shared client and store

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod rate;
mod service;
mod sqlite;
mod store;

pub use error::{QuoteError, StoreError, StoreResult};
pub use rate::{decode_rate, numeric_string, ExchangeRate};
pub use service::{QuoteConfig, QuoteService, DEFAULT_PAIR, DEFAULT_UPSTREAM_URL};
pub use sqlite::SqliteExchangeStore;
pub use store::{ExchangeStore, MemoryExchangeStore};
