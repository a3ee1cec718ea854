//! Fetch-then-persist against a real SQLite database.

use std::sync::Arc;
use std::time::Duration;

use kairos_core::fixtures::{ScriptedHttpClient, ScriptedReply};
use kairos_core::{CallContext, HttpReply};
use kairos_quote::{ExchangeStore, QuoteConfig, QuoteService, SqliteExchangeStore};

const URL: &str = "http://upstream/json/last/USD-BRL";

fn config() -> QuoteConfig {
    QuoteConfig {
        upstream_url: URL.to_string(),
        query_timeout: Duration::from_millis(200),
        // Generous: the insert runs on a real blocking SQLite worker
        persist_timeout: Duration::from_secs(2),
        ..QuoteConfig::default()
    }
}

async fn service(reply: ScriptedReply) -> (QuoteService, Arc<SqliteExchangeStore>) {
    let store = Arc::new(SqliteExchangeStore::connect("sqlite::memory:").await.unwrap());
    let client = ScriptedHttpClient::new().route(URL, reply);
    let svc = QuoteService::new(Arc::new(client), Arc::clone(&store) as Arc<dyn ExchangeStore>, &config());
    (svc, store)
}

#[tokio::test]
async fn test_fast_upstream_stores_one_row() {
    let (svc, store) = service(ScriptedReply::after(
        Duration::from_millis(50),
        HttpReply::ok(r#"{"bid":"5.43"}"#),
    ))
    .await;

    let rate = svc.fetch(&CallContext::new()).await.unwrap();

    assert!((rate.bid - 5.43).abs() < f64::EPSILON);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_slow_upstream_stores_nothing() {
    let (svc, store) = service(ScriptedReply::after(
        Duration::from_millis(400),
        HttpReply::ok(r#"{"bid":"5.43"}"#),
    ))
    .await;

    let started = std::time::Instant::now();
    let err = svc.fetch(&CallContext::new()).await.unwrap_err();

    assert!(err.to_string().contains("timeout"), "{err}");
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_repeated_fetch_stores_each_rate() {
    let (svc, store) = service(ScriptedReply::now(HttpReply::ok(
        r#"{"USDBRL":{"code":"USD","codein":"BRL","bid":"5.43","timestamp":"1700000000"}}"#,
    )))
    .await;

    svc.fetch(&CallContext::new()).await.unwrap();
    svc.fetch(&CallContext::new()).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
}
