//! Persistence port for exchange rates.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::rate::ExchangeRate;

/// Storage for fetched exchange rates.
///
/// Callers bound each operation with their own scope; implementations
/// must tolerate being dropped mid-operation.
#[async_trait]
pub trait ExchangeStore: Send + Sync {
    /// Appends one record.
    async fn insert(&self, rate: &ExchangeRate) -> StoreResult<()>;

    /// Number of stored records.
    async fn count(&self) -> StoreResult<u64>;
}

/// In-process store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryExchangeStore {
    rows: Mutex<Vec<ExchangeRate>>,
    delay: Duration,
    fail: bool,
}

impl MemoryExchangeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose inserts always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Makes each insert take `delay` before completing.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Snapshot of the stored records.
    pub fn rows(&self) -> Vec<ExchangeRate> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl ExchangeStore for MemoryExchangeStore {
    async fn insert(&self, rate: &ExchangeRate) -> StoreResult<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(StoreError::Persistence("store unavailable".to_string()));
        }
        self.rows.lock().push(rate.clone());
        Ok(())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.rows.lock().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_appends() {
        let store = MemoryExchangeStore::new();
        let rate = ExchangeRate {
            bid: 5.43,
            ..ExchangeRate::default()
        };

        store.insert(&rate).await.unwrap();
        store.insert(&rate).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.rows()[1], rate);
    }

    #[tokio::test]
    async fn test_failing_store_rejects_insert() {
        let store = MemoryExchangeStore::failing();
        let err = store.insert(&ExchangeRate::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_insert_waits() {
        let store = MemoryExchangeStore::new().with_delay(Duration::from_millis(50));
        let start = tokio::time::Instant::now();
        store.insert(&ExchangeRate::default()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }
}
