//! SQLite-backed [`ExchangeStore`].

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::rate::ExchangeRate;
use crate::store::ExchangeStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS exchanges(
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  code TEXT NOT NULL,
  codein TEXT NOT NULL,
  name TEXT NOT NULL,
  high REAL NOT NULL,
  low REAL NOT NULL,
  varbid REAL NOT NULL,
  pctchange REAL NOT NULL,
  bid REAL NOT NULL,
  ask REAL NOT NULL,
  timestamp INTEGER NOT NULL,
  createdate TEXT NOT NULL,
  created_at TEXT NOT NULL
)"#;

/// Exchange rates stored in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteExchangeStore {
    pool: SqlitePool,
}

impl SqliteExchangeStore {
    /// Opens (creating if missing) the database at `url` and runs the migration.
    ///
    /// `url` is a sqlx SQLite URL such as `sqlite://cotacoes.sqlite` or
    /// `sqlite::memory:`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connect(format!("{url}: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to an in-memory database is a separate database
        let in_memory = url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connect(format!("{url}: {e}")))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url, "exchange store ready");
        Ok(store)
    }

    /// Creates the schema if it does not exist. Safe to run repeatedly.
    pub async fn migrate(&self) -> StoreResult<()> {
        debug!("DB migrate start");
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        debug!("DB migrate done");
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ExchangeStore for SqliteExchangeStore {
    async fn insert(&self, rate: &ExchangeRate) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO exchanges(
              code, codein, name, high, low, varbid, pctchange,
              bid, ask, timestamp, createdate, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&rate.code)
        .bind(&rate.codein)
        .bind(&rate.name)
        .bind(rate.high)
        .bind(rate.low)
        .bind(rate.var_bid)
        .bind(rate.pct_change)
        .bind(rate.bid)
        .bind(rate.ask)
        .bind(rate.timestamp)
        .bind(&rate.create_date)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Persistence(format!("insert exchange: {e}")))?;
        Ok(())
    }

    async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exchanges")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Persistence(format!("count exchanges: {e}")))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
