//! # Kairos Core
//!
//! Bounded-latency, cancellable outbound calls.
//!
//! - [`CallContext`] - Deadline and cancellation scope; children take the earlier deadline
//! - [`CallSpec`] / [`call_with_deadline`] - One GET, bounded by its own budget, no retries
//! - [`CallOutcome`] - Exactly-once terminal record of a call with its elapsed time
//! - [`RaceOrchestrator`] - Runs N calls, waits for all, keeps the fastest success
//! - [`HttpClient`] - Outbound HTTP port, with a [`ReqwestHttpClient`] adapter
//! - [`CallError`] / [`RaceError`] - Failure taxonomy

#![doc(html_root_url = "https://docs.rs/kairos-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod call;
mod cancel;
mod client;
mod context;
pub mod duration;
mod error;
pub mod fixtures;
mod outcome;
mod race;

pub use call::{call_with_deadline, execute, CallSpec, Decoder};
pub use cancel::Cancellation;
pub use client::{HttpClient, HttpReply, ReqwestHttpClient};
pub use context::CallContext;
pub use error::{CallError, CallResult, RaceError};
pub use outcome::CallOutcome;
pub use race::{select_winner, RaceOrchestrator, RaceResult};
