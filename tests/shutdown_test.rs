mod common;

use std::time::{Duration, Instant};

use common::{client, free_port, load, start_gateway, start_slow_backend};
use gateway::http::ServerState;
use reqwest::StatusCode;

fn single_rule(dir: &std::path::Path, port: u16, backend: u16) -> gateway::GatewayConfig {
    load(
        dir,
        &format!(
            r#"
[[server]]
protocol = "http"
hosts = ["127.0.0.1", "127.0.0.2"]
port = {port}

[[server.proxy]]
name = "slow"
from = {{ path = "/" }}
to = {{ host = "127.0.0.1", port = {backend} }}
"#
        ),
    )
}

#[tokio::test]
async fn test_in_flight_request_completes() {
    let backend = start_slow_backend(Duration::from_millis(600), "done").await;
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let gateway = start_gateway(&single_rule(dir.path(), port, backend.port())).await;
    let frontend = gateway.frontends()[0].clone();
    let http = client(&[]);

    let in_flight = tokio::spawn({
        let http = http.clone();
        async move { http.get(format!("http://127.0.0.1:{}/work", port)).send().await }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(frontend.state(), ServerState::Serving);

    gateway.shutdown_handle().trigger();
    gateway.wait(Duration::from_secs(5)).await.unwrap();

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "done");
    assert_eq!(frontend.state(), ServerState::Stopped);

    // Both addresses stopped accepting.
    for addr in ["127.0.0.1", "127.0.0.2"] {
        let refused = http.get(format!("http://{}:{}/", addr, port)).send().await;
        assert!(refused.is_err(), "{} still accepting", addr);
    }
}

#[tokio::test]
async fn test_request_past_deadline_is_cut_off() {
    let backend = start_slow_backend(Duration::from_secs(10), "too late").await;
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let gateway = start_gateway(&single_rule(dir.path(), port, backend.port())).await;

    let in_flight = tokio::spawn(async move {
        client(&[])
            .get(format!("http://127.0.0.2:{}/work", port))
            .send()
            .await
    });
    tokio::time::sleep(Duration::from_millis(150)).await;

    let started = Instant::now();
    gateway.shutdown_handle().trigger();
    gateway.wait(Duration::from_millis(500)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    let result = in_flight.await.unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_stops_on_future() {
    let backend = start_slow_backend(Duration::from_millis(0), "ok").await;
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config = single_rule(dir.path(), port, backend.port());

    let stop = tokio::time::sleep(Duration::from_millis(300));
    let started = Instant::now();
    gateway::lifecycle::run(&config, stop, Duration::from_secs(1))
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(300));
}
