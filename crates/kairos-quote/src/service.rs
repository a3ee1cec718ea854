//! Fetch the current rate, then persist it under a separate budget.

use std::sync::Arc;
use std::time::Duration;

use kairos_core::{execute, CallContext, CallSpec, HttpClient};
use tracing::{debug, info, warn};

use crate::error::QuoteError;
use crate::rate::{decode_rate, ExchangeRate};
use crate::store::ExchangeStore;

/// Default upstream endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";

/// Default currency-pair key of the upstream payload.
pub const DEFAULT_PAIR: &str = "USDBRL";

/// Settings of a [`QuoteService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteConfig {
    /// Upstream endpoint returning the current rate.
    pub upstream_url: String,
    /// Key wrapping the record in the upstream payload.
    pub pair: String,
    /// Budget of the upstream call.
    pub query_timeout: Duration,
    /// Budget of the insert that follows a successful fetch.
    pub persist_timeout: Duration,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            pair: DEFAULT_PAIR.to_string(),
            query_timeout: Duration::from_millis(200),
            persist_timeout: Duration::from_millis(10),
        }
    }
}

/// Fetches exchange rates and records each one.
///
/// The HTTP client and store are opened once and shared by every request.
pub struct QuoteService {
    client: Arc<dyn HttpClient>,
    store: Arc<dyn ExchangeStore>,
    spec: CallSpec<ExchangeRate>,
    persist_timeout: Duration,
}

impl QuoteService {
    /// Creates a service over a shared client and store.
    pub fn new(
        client: Arc<dyn HttpClient>,
        store: Arc<dyn ExchangeStore>,
        config: &QuoteConfig,
    ) -> Self {
        let pair = config.pair.clone();
        let spec = CallSpec::new(
            "exchange-rate",
            config.upstream_url.clone(),
            config.query_timeout,
            move |body| decode_rate(body, &pair),
        );
        Self {
            client,
            store,
            spec,
            persist_timeout: config.persist_timeout,
        }
    }

    /// The store records are written to.
    pub fn store(&self) -> &Arc<dyn ExchangeStore> {
        &self.store
    }

    /// Fetches the current rate within `query_timeout`, then persists it.
    ///
    /// Persistence runs in its own scope derived from `ctx` (not from the
    /// fetch scope) and bounded by `persist_timeout`. A persistence failure is
    /// logged and counted; the fetched rate is still returned.
    pub async fn fetch(&self, ctx: &CallContext) -> Result<ExchangeRate, QuoteError> {
        let outcome = execute(ctx, self.client.as_ref(), &self.spec).await;
        let elapsed = outcome.elapsed();
        let rate = outcome.into_result()?;
        debug!(bid = rate.bid, elapsed_ms = elapsed.as_millis() as u64, "exchange rate fetched");

        self.persist(ctx, &rate).await;
        Ok(rate)
    }

    async fn persist(&self, ctx: &CallContext, rate: &ExchangeRate) {
        let scope = ctx.child(self.persist_timeout);
        match scope.run(self.store.insert(rate)).await {
            Ok(Ok(())) => {
                info!(bid = rate.bid, "exchange rate persisted");
            }
            Ok(Err(e)) => {
                warn!(error = %e, "failed to persist exchange rate");
                kairos_telemetry::metrics::record_persist_failure();
            }
            Err(e) => {
                warn!(error = %e, "persisting exchange rate did not complete");
                kairos_telemetry::metrics::record_persist_failure();
            }
        }
    }
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("spec", &self.spec)
            .field("persist_timeout", &self.persist_timeout)
            .finish_non_exhaustive()
    }
}
