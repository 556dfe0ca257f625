#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the liveness endpoint lifecycle.

use std::time::Duration;

use {relaybot_config::LivenessConfig, tokio_util::sync::CancellationToken};

use relaybot_gateway::start_liveness;

fn local_config(message: &str) -> LivenessConfig {
    LivenessConfig {
        enabled: true,
        bind: "127.0.0.1".into(),
        port: 0,
        message: message.into(),
    }
}

#[tokio::test]
async fn serves_until_cancelled() {
    let cancel = CancellationToken::new();
    let (addr, handle) = start_liveness(&local_config("Bot is running"), cancel.clone())
        .await
        .unwrap();

    let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Bot is running");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after cancellation")
        .unwrap();

    assert!(reqwest::get(format!("http://{addr}/")).await.is_err());
}

#[tokio::test]
async fn bind_conflict_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = local_config("up");
    config.port = taken.local_addr().unwrap().port();

    let err = start_liveness(&config, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to bind"));
}
