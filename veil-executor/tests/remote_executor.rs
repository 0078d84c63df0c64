//! Integration tests: `RemoteExecutor` against an in-process HTTP stub.
//!
//! The stub accepts a single connection, captures the raw request and
//! answers with a canned query API envelope.

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use veil_core::QueryRequest;
use veil_executor::{ExecutorError, QueryExecutor, RemoteConfig, RemoteExecutor};

/// Serve one canned response; the handle yields the captured request text.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}/client/v4/d1/query"), handle)
}

/// Read headers plus a `content-length` body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn executor(endpoint: String, token: Option<&str>) -> RemoteExecutor {
    RemoteExecutor::new(RemoteConfig::new(endpoint, token.map(str::to_owned)))
        .expect("valid endpoint")
}

#[tokio::test]
async fn remote_select_returns_rows_and_sends_bearer_token() {
    let body = json!({
        "success": true,
        "errors": [],
        "result": [{
            "success": true,
            "results": [{"answer": 42}],
            "meta": {"duration": 0.1, "changes": 0, "rows_read": 0}
        }]
    })
    .to_string();
    let (endpoint, server) = serve_once("200 OK", body).await;

    let exec = executor(endpoint, Some("api-token-1"));
    let rows = exec
        .execute(&QueryRequest::new("SELECT ? AS answer", vec![json!(42)]))
        .await
        .expect("remote execute");

    assert_eq!(rows.results.len(), 1);
    assert_eq!(rows.results[0].get("answer"), Some(&json!(42)));

    let captured = server.await.expect("stub task");
    let lowered = captured.to_lowercase();
    assert!(lowered.starts_with("post /client/v4/d1/query http/1.1"), "got: {captured}");
    assert!(lowered.contains("authorization: bearer api-token-1"));
    assert!(lowered.contains("content-type: application/json"));
    assert!(captured.contains(r#""sql":"SELECT ? AS answer""#));
    assert!(captured.contains(r#""params":[42]"#));
}

#[tokio::test]
async fn remote_without_token_sends_no_authorization() {
    let body = json!({"success": true, "errors": [], "result": [{"results": [], "meta": {}}]})
        .to_string();
    let (endpoint, server) = serve_once("200 OK", body).await;

    let exec = executor(endpoint, None);
    let rows = exec
        .execute(&QueryRequest::new("DELETE FROM t", Vec::new()))
        .await
        .expect("remote execute");
    assert!(rows.results.is_empty());

    let captured = server.await.expect("stub task").to_lowercase();
    assert!(!captured.contains("authorization:"));
}

#[tokio::test]
async fn remote_sql_error_is_relayed_verbatim() {
    let body = json!({
        "success": false,
        "errors": [{"code": 7500, "message": "no such table: missing: SQLITE_ERROR"}],
        "result": []
    })
    .to_string();
    let (endpoint, server) = serve_once("400 Bad Request", body).await;

    let exec = executor(endpoint, Some("t"));
    let result = exec.execute(&QueryRequest::new("SELECT * FROM missing", Vec::new())).await;
    match result {
        Err(ExecutorError::Database(message)) => {
            assert_eq!(message, "no such table: missing: SQLITE_ERROR");
        }
        other => panic!("expected Database error, got {other:?}"),
    }
    server.await.expect("stub task");
}

#[tokio::test]
async fn remote_unreachable_endpoint_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);

    let exec = executor(format!("http://{addr}/query"), None);
    let result = exec.execute(&QueryRequest::new("SELECT 1", Vec::new())).await;
    assert!(
        matches!(result, Err(ExecutorError::Connect(_))),
        "expected Connect error, got {result:?}"
    );
}

#[tokio::test]
async fn remote_silent_endpoint_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let mut config = RemoteConfig::new(format!("http://{addr}/query"), None);
    config.timeout = Duration::from_millis(200);
    let exec = RemoteExecutor::new(config).expect("valid endpoint");

    let result = exec.execute(&QueryRequest::new("SELECT 1", Vec::new())).await;
    match result {
        Err(ExecutorError::Api(message)) => assert!(message.contains("200ms"), "got: {message}"),
        other => panic!("expected timeout, got {other:?}"),
    }
    server.abort();
}
