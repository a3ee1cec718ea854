//! Fan-in races between independent providers.
//!
//! [`RaceOrchestrator::race`] starts every [`CallSpec`] as its own task under
//! a shared parent [`CallContext`], waits until **every** branch has reported
//! an outcome, and only then picks a winner with [`select_winner`]:
//!
//! - only successful outcomes qualify;
//! - the smallest elapsed time wins;
//! - ties go to the branch declared first.
//!
//! A branch that times out, is cancelled, or panics still reports a failed
//! outcome, so collection always completes. Every branch is bounded by its
//! own deadline, which bounds the whole race by the largest branch timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use kairos_core::{CallContext, CallSpec, RaceOrchestrator, ReqwestHttpClient};
//!
//! let race = RaceOrchestrator::new(Arc::new(ReqwestHttpClient::new()?));
//! let result = race
//!     .race(&CallContext::new(), vec![
//!         CallSpec::text("ViaCEP", "http://viacep.com.br/ws/01001000/json", Duration::from_secs(1)),
//!         CallSpec::text("BrasilAPI", "https://brasilapi.com.br/api/cep/v1/01001000", Duration::from_secs(1)),
//!     ])
//!     .await?;
//! println!("{} won in {:?}", result.winner().label(), result.winner().elapsed());
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::call::{execute, CallSpec};
use crate::client::HttpClient;
use crate::context::CallContext;
use crate::error::{CallError, RaceError};
use crate::outcome::CallOutcome;

/// The selected outcome of a race, plus every other branch's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResult<T> {
    winner: CallOutcome<T>,
    others: Vec<CallOutcome<T>>,
}

impl<T> RaceResult<T> {
    /// The winning outcome. Always successful.
    #[must_use]
    pub fn winner(&self) -> &CallOutcome<T> {
        &self.winner
    }

    /// Outcomes of the branches that did not win, in declaration order.
    #[must_use]
    pub fn others(&self) -> &[CallOutcome<T>] {
        &self.others
    }

    /// Consumes the result, returning the winning outcome.
    pub fn into_winner(self) -> CallOutcome<T> {
        self.winner
    }
}

/// Runs several calls concurrently and keeps the fastest useful one.
#[derive(Clone)]
pub struct RaceOrchestrator {
    client: Arc<dyn HttpClient>,
}

impl RaceOrchestrator {
    /// Creates an orchestrator issuing every branch through `client`.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Races `specs` under `ctx` and returns the winner.
    ///
    /// Returns [`RaceError::NoWinner`] when no branch produced a payload,
    /// including when `specs` is empty.
    pub async fn race<T>(
        &self,
        ctx: &CallContext,
        specs: Vec<CallSpec<T>>,
    ) -> Result<RaceResult<T>, RaceError>
    where
        T: Send + 'static,
    {
        let started = Instant::now();
        let mut branches = Branches(Vec::with_capacity(specs.len()));

        for spec in specs {
            let client = Arc::clone(&self.client);
            let ctx = ctx.clone();
            let label = spec.label().to_string();
            let handle = tokio::spawn(async move { execute(&ctx, client.as_ref(), &spec).await });
            branches.0.push((label, handle));
        }

        let mut outcomes = Vec::with_capacity(branches.0.len());
        for (label, handle) in &mut branches.0 {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(label = %label, error = %e, "race branch ended without reporting");
                    CallOutcome::new(
                        label.clone(),
                        started.elapsed(),
                        Err(CallError::aborted(e.to_string())),
                    )
                }
            };
            outcomes.push(outcome);
        }

        let result = select_winner(outcomes);
        match &result {
            Ok(race) => {
                info!(
                    winner = %race.winner.label(),
                    elapsed_ms = race.winner.elapsed().as_millis() as u64,
                    branches = race.others.len() + 1,
                    "race decided"
                );
                kairos_telemetry::metrics::record_race_winner(race.winner.label());
            }
            Err(e) => {
                warn!(error = %e, "race produced no winner");
                kairos_telemetry::metrics::record_race_failure();
            }
        }
        result
    }
}

/// Picks the winning outcome among fully collected branch outcomes.
///
/// Among successful outcomes the smallest elapsed time wins, ties going to
/// the earliest position in `outcomes`.
pub fn select_winner<T>(outcomes: Vec<CallOutcome<T>>) -> Result<RaceResult<T>, RaceError> {
    let mut best: Option<usize> = None;
    for (idx, outcome) in outcomes.iter().enumerate() {
        if !outcome.is_success() {
            continue;
        }
        match best {
            Some(current) if outcomes[current].elapsed() <= outcome.elapsed() => {}
            _ => best = Some(idx),
        }
    }

    match best {
        Some(idx) => {
            let mut others = outcomes;
            let winner = others.remove(idx);
            Ok(RaceResult { winner, others })
        }
        None => {
            let failures = outcomes
                .into_iter()
                .map(|outcome| {
                    let (label, _, result) = outcome.into_parts();
                    let error = result.err().unwrap_or(CallError::Cancelled);
                    (label, error)
                })
                .collect();
            Err(RaceError::NoWinner { failures })
        }
    }
}

/// Join handles of in-flight branches; aborts any still running when the
/// race itself is dropped.
struct Branches<T>(Vec<(String, JoinHandle<CallOutcome<T>>)>);

impl<T> Drop for Branches<T> {
    fn drop(&mut self) {
        for (_, handle) in &self.0 {
            handle.abort();
        }
    }
}
