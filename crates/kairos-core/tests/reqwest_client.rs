//! Integration tests for the reqwest adapter against live local servers.

use std::time::Duration;

use kairos_core::{
    call_with_deadline, CallContext, CallError, CallSpec, HttpClient, RaceOrchestrator,
    ReqwestHttpClient,
};
use mockito::Server;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug, Deserialize, PartialEq)]
struct Quote {
    bid: String,
}

/// Accepts connections and never answers.
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/slow")
}

#[tokio::test]
async fn test_decodes_successful_reply() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/quote")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"bid":"5.43"}"#)
        .create_async()
        .await;

    let client = ReqwestHttpClient::new().unwrap();
    let spec = CallSpec::<Quote>::json(
        "quote",
        format!("{}/quote", server.url()),
        Duration::from_secs(2),
    );

    let quote = call_with_deadline(&CallContext::new(), &client, &spec)
        .await
        .unwrap();

    assert_eq!(quote.bid, "5.43");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_protocol_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/quote")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = ReqwestHttpClient::new().unwrap();
    let spec = CallSpec::<Quote>::json(
        "quote",
        format!("{}/quote", server.url()),
        Duration::from_secs(2),
    );

    let err = call_with_deadline(&CallContext::new(), &client, &spec)
        .await
        .unwrap_err();

    assert_eq!(err, CallError::Protocol { status: 500 });
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/quote")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = ReqwestHttpClient::new().unwrap();
    let spec = CallSpec::<Quote>::json(
        "quote",
        format!("{}/quote", server.url()),
        Duration::from_secs(2),
    );

    let err = call_with_deadline(&CallContext::new(), &client, &spec)
        .await
        .unwrap_err();

    assert!(matches!(err, CallError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn test_silent_server_times_out_near_budget() {
    let url = silent_server().await;
    let client = ReqwestHttpClient::new().unwrap();
    let spec = CallSpec::<Quote>::json("quote", url, Duration::from_millis(100));

    let started = std::time::Instant::now();
    let err = call_with_deadline(&CallContext::new(), &client, &spec)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "{err:?}");
    assert!(elapsed >= Duration::from_millis(90), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ReqwestHttpClient::new().unwrap();
    let spec = CallSpec::<Quote>::json(
        "quote",
        format!("http://{addr}/quote"),
        Duration::from_secs(2),
    );

    let err = call_with_deadline(&CallContext::new(), &client, &spec)
        .await
        .unwrap_err();

    assert!(matches!(err, CallError::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn test_race_prefers_answering_provider_over_silent_one() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/cep")
        .with_status(200)
        .with_body(r#"{"cep":"01001-000"}"#)
        .create_async()
        .await;
    let silent = silent_server().await;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new().unwrap());
    let orchestrator = RaceOrchestrator::new(client);
    let specs = vec![
        CallSpec::text("silent", silent, Duration::from_millis(150)),
        CallSpec::text("mock", format!("{}/cep", server.url()), Duration::from_millis(150)),
    ];

    let result = orchestrator.race(&CallContext::new(), specs).await.unwrap();

    assert_eq!(result.winner().label(), "mock");
    assert!(result.winner().payload().unwrap().contains("01001-000"));
    assert_eq!(result.others().len(), 1);
    assert!(result.others()[0].error().unwrap().is_timeout());
}
