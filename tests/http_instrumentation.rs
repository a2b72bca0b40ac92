// SPDX-License-Identifier: MPL-2.0
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use diaglog::diagnostics::{LogLevel, LogStore};
use diaglog::instrument::{HttpInstrumentor, InstrumentedClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves every connection with `status_line` and a JSON `body` after `delay`.
async fn spawn_server(
    status_line: &'static str,
    body: &'static str,
    delay: Duration,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                tokio::time::sleep(delay).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

fn client_for(addr: SocketAddr) -> (Arc<LogStore>, InstrumentedClient) {
    let store = Arc::new(LogStore::in_memory());
    let client = InstrumentedClient::with_defaults(HttpInstrumentor::new(Arc::clone(&store)))
        .expect("client should build")
        .with_base_url(format!("http://{addr}"));
    (store, client)
}

#[tokio::test]
async fn test_server_error_is_logged_and_returned() {
    let addr = spawn_server(
        "500 Internal Server Error",
        r#"{"message":"database unavailable"}"#,
        Duration::from_millis(120),
    )
    .await;
    let (store, client) = client_for(addr);

    let response = client
        .send(client.get("/x"))
        .await
        .expect("a 500 response is still a response");
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.url().as_str(), format!("http://{addr}/x"));
    assert_eq!(response.headers()["content-type"], "application/json");

    let network = store.network_entries();
    assert_eq!(network.len(), 1);
    assert_eq!(network[0].method, "GET");
    assert_eq!(network[0].url, "/x");
    assert_eq!(network[0].status, 500);
    assert!(
        network[0].response_time_ms >= 120,
        "response time {} should include the server delay",
        network[0].response_time_ms
    );
    let network_data = network[0].data.clone().expect("data should be set");
    assert_eq!(network_data["response"]["message"], "database unavailable");
    assert_eq!(network_data["error"], "Request failed with status code 500");

    let errors = store.entries(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "API Response Error");
    let data = errors[0].data.clone().expect("data should be set");
    assert_eq!(data["status"], 500);
    assert_eq!(data["url"], "/x");

    let body = response.text().await.expect("buffered body should be readable");
    assert_eq!(body, r#"{"message":"database unavailable"}"#);
}

#[tokio::test]
async fn test_successful_request_is_logged() {
    let addr = spawn_server("200 OK", "{}", Duration::ZERO).await;
    let (store, client) = client_for(addr);

    let response = client
        .send(client.post("/items").body("{}"))
        .await
        .expect("request should succeed");
    assert!(response.status().is_success());

    let debug = store.entries(LogLevel::Debug);
    assert_eq!(debug.len(), 1);
    assert_eq!(debug[0].message, "API Request: POST /items");
    let request = debug[0].data.clone().expect("data should be set");
    assert_eq!(request["headers"]["content-type"], "application/json");

    let network = store.network_entries();
    assert_eq!(network.len(), 1);
    assert_eq!(network[0].status, 200);
    let data = network[0].data.clone().expect("data should be set");
    assert_eq!(data["headers"]["content-type"], "application/json");
    assert!(store.entries(LogLevel::Error).is_empty());
}

#[tokio::test]
async fn test_unreachable_server_yields_status_zero() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        listener.local_addr().expect("listener should have an address")
    };
    let (store, client) = client_for(addr);

    let result = client.send(client.get("/down")).await;
    assert!(result.is_err(), "the original error must reach the caller");

    let network = store.network_entries();
    assert_eq!(network.len(), 1);
    assert_eq!(network[0].method, "GET");
    assert_eq!(network[0].url, "/down");
    assert_eq!(network[0].status, 0);

    let errors = store.entries(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    let data = errors[0].data.clone().expect("data should be set");
    assert!(data["status"].is_null());
    assert!(data["errorMessage"].is_string());
}

#[tokio::test]
async fn test_invalid_request_is_logged_as_request_error() {
    let store = Arc::new(LogStore::in_memory());
    let client = InstrumentedClient::with_defaults(HttpInstrumentor::new(Arc::clone(&store)))
        .expect("client should build");

    let result = client.send(client.get("not a url")).await;
    assert!(result.is_err());

    let network = store.network_entries();
    assert_eq!(network.len(), 1);
    assert_eq!(network[0].method, "UNKNOWN");
    assert_eq!(network[0].url, "UNKNOWN");
    assert_eq!(store.entries(LogLevel::Error)[0].message, "API Request Error");
}

#[tokio::test]
async fn test_disabled_capture_keeps_network_telemetry() {
    let addr = spawn_server("503 Service Unavailable", "", Duration::ZERO).await;
    let (store, client) = client_for(addr);
    store.disable();

    let response = client
        .send(client.get("/quiet"))
        .await
        .expect("request should complete");
    assert_eq!(response.status().as_u16(), 503);

    let network = store.network_entries();
    assert_eq!(network.len(), 1);
    let data = network[0].data.clone().expect("data should be set");
    assert!(data["response"].is_null(), "an empty body is not logged");
    assert!(store.entries(LogLevel::Debug).is_empty());
    assert!(store.entries(LogLevel::Error).is_empty());
}
