//! HTTP transport against real sockets on localhost.

use std::time::Duration;

use near_bridge::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::common::init_tracing;

/// Read one HTTP request and return its body.
async fn read_request_body(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return String::new();
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            return String::from_utf8_lossy(&buf[body_start..body_start + content_length])
                .into_owned();
        }
    }
}

/// Accept a single connection and answer it with a canned response.
///
/// The handle resolves to the body of the request that was received.
async fn serve_once(status: &'static str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request_body(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (url, handle)
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_status_poll_over_http() {
    init_tracing();
    let (url, server) = serve_once(
        "200 OK",
        r#"{"jsonrpc":"2.0","id":0,"result":{"status":"Completed","value":[1,2]}}"#,
    )
    .await;
    let near = Near::custom(url).build().unwrap();

    let status = near.get_transaction_status("abc").await.unwrap();
    assert_eq!(
        status,
        serde_json::json!({"status": "Completed", "value": [1, 2]})
    );

    let request: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "get_transaction_status");
    assert_eq!(request["params"], serde_json::json!({"hash": "abc"}));
    assert!(request["id"].is_u64());
}

#[tokio::test]
async fn test_signed_submission_over_http() {
    init_tracing();
    let (url, server) = serve_once(
        "200 OK",
        r#"{"jsonrpc":"2.0","id":0,"result":{"hash":"3xRDxw"}}"#,
    )
    .await;
    let near = Near::custom(url).network_id("near").build().unwrap();
    let key_pair = near.generate_key("alice").unwrap();

    let receipt = near
        .send_money("alice", "bob", NearToken::from_yoctonear(5))
        .await
        .unwrap();
    assert_eq!(receipt.hash, "3xRDxw");

    let request: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(request["method"], "send_money");
    assert_eq!(request["params"]["body"]["amount"], "5");
    assert_eq!(request["params"]["public_key"], key_pair.public_key());

    let signed: SignedTransaction = serde_json::from_value(request["params"].clone()).unwrap();
    let hash = TransactionBody {
        method: "send_money",
        params: &signed.body,
    }
    .hash()
    .unwrap();
    assert!(signed.signature.verify(&hash, key_pair.public_key()));
}

// =============================================================================
// Failure kinds
// =============================================================================

#[tokio::test]
async fn test_json_rpc_error_is_node_error() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32000,"message":"Server error","data":"unknown transaction"}}"#,
    )
    .await;
    let near = Near::custom(url).build().unwrap();

    let err = near.get_transaction_status("missing").await.unwrap_err();
    assert!(err.is_node_error(), "{err:?}");
    assert!(!err.is_transport_failure());
    assert!(err.to_string().contains("Server error"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_http_error_status_is_transport_failure() {
    let (url, server) = serve_once("503 Service Unavailable", r#"{"busy":true}"#).await;
    let near = Near::custom(url).build().unwrap();

    let err = near.view_account("bob").await.unwrap_err();
    assert!(err.is_transport_failure(), "{err:?}");
    match err {
        Error::Rpc(RpcError::Network { status_code, .. }) => assert_eq!(status_code, Some(503)),
        other => panic!("expected network error, got {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_undecodable_body_is_transport_failure() {
    let (url, server) = serve_once("200 OK", "<html>gateway</html>").await;
    let near = Near::custom(url).build().unwrap();

    let err = near.view_state("counter").await.unwrap_err();
    assert!(err.is_transport_failure(), "{err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let near = Near::custom("http://127.0.0.1:1").build().unwrap();

    let err = near.get_transaction_status("abc").await.unwrap_err();
    assert!(err.is_transport_failure(), "{err:?}");
    assert!(!err.is_node_error());
}

#[tokio::test]
async fn test_timeout_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        // Hold the connection open without answering
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
    });

    let near = Near::custom(url)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = near.get_transaction_status("abc").await.unwrap_err();
    assert!(err.is_transport_failure(), "{err:?}");
}
