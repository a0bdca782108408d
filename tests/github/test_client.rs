//! Tests for the Octocrab-backed client.

use org_metrics::github::pagination::PageSource;
use org_metrics::github::{ApiResponse, GitHubClient};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Local server answering every request with 503, counting what it receives.
async fn unavailable_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let counter = counter.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let body = r#"{"message":"Service Unavailable"}"#;
                let response = format!(
                    "HTTP/1.1 503 Service Unavailable\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), hits)
}

#[tokio::test]
async fn test_client_builds_with_token() {
    assert!(GitHubClient::with_token("ghp_test").is_ok());
}

#[tokio::test]
async fn test_invalid_base_uri_is_a_setup_error() {
    let built = GitHubClient::builder()
        .personal_token("ghp_test")
        .base_uri("not a uri")
        .build();
    assert!(built.is_err());
}

#[tokio::test]
async fn test_server_error_is_sent_once() {
    let (base, hits) = unavailable_server().await;
    let client = GitHubClient::builder()
        .personal_token("ghp_test")
        .base_uri(base)
        .build()
        .unwrap();

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        client.get("/repos/acme/api/releases", &[]),
    )
    .await
    .unwrap();

    match response {
        ApiResponse::Transient(reason) => assert!(reason.contains("503"), "{reason}"),
        other => panic!("expected a transient failure, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
