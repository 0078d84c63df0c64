//! Executor for a remote managed database exposing a REST query endpoint.
//!
//! Each statement is one `POST {"sql": .., "params": [..]}` over HTTP/1.1,
//! using a fresh hyper connection on a Tokio TCP stream. The response is the
//! usual REST envelope:
//!
//! ```json
//! {"success": true, "errors": [], "result": [{"results": [..], "meta": {..}, "success": true}]}
//! ```
//!
//! Only plain `http://` endpoints are accepted; deployments that reach the
//! database over TLS run a local forward proxy.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpStream;
use veil_core::{QueryMeta, QueryRequest, QueryRows, Row};

use crate::backend::QueryExecutor;
use crate::{ExecutorError, RemoteConfig};

/// Forwards statements to a remote query API.
#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    /// `host:port` to dial.
    address: String,
    /// Value of the `Host` header.
    authority: String,
    /// Request target, e.g. `/client/v4/accounts/a/d1/database/b/query`.
    path: Uri,
    config: RemoteConfig,
}

impl RemoteExecutor {
    /// Validate the endpoint and build an executor.
    ///
    /// # Errors
    /// Returns [`ExecutorError::UnsupportedEndpoint`] if the URL does not
    /// parse, has no host, or uses a scheme other than `http`.
    pub fn new(config: RemoteConfig) -> Result<Self, ExecutorError> {
        let uri: Uri = config
            .endpoint
            .parse()
            .map_err(|e| ExecutorError::UnsupportedEndpoint(format!("{}: {e}", config.endpoint)))?;

        if uri.scheme_str() != Some("http") {
            return Err(ExecutorError::UnsupportedEndpoint(format!(
                "{}: only http:// endpoints are supported",
                config.endpoint
            )));
        }
        let Some(authority) = uri.authority() else {
            return Err(ExecutorError::UnsupportedEndpoint(format!(
                "{}: missing host",
                config.endpoint
            )));
        };

        let address = format!("{}:{}", authority.host(), uri.port_u16().unwrap_or(80));
        let authority = authority.as_str().to_owned();
        let path_and_query = uri.path_and_query().map_or("/", |p| p.as_str());
        let path: Uri = path_and_query
            .parse()
            .map_err(|e| ExecutorError::UnsupportedEndpoint(format!("{path_and_query}: {e}")))?;

        Ok(Self { address, authority, path, config })
    }

    /// Send one JSON body and return the status and raw response body.
    async fn post_json(&self, body: String) -> Result<(StatusCode, Bytes), ExecutorError> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| ExecutorError::Connect(format!("connect to {}: {e}", self.address)))?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ExecutorError::Api(format!("HTTP handshake: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("query API connection closed: {e}");
            }
        });

        let body_bytes = Bytes::from(body);
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.path.clone())
            .header(HOST, self.authority.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body_bytes.len().to_string());

        if let Some(token) = &self.config.api_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let req = builder
            .body(Full::new(body_bytes))
            .map_err(|e| ExecutorError::Api(format!("build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ExecutorError::Api(format!("send request: {e}")))?;

        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ExecutorError::Api(format!("read response body: {e}")))?
            .to_bytes();

        Ok((status, bytes))
    }
}

#[async_trait]
impl QueryExecutor for RemoteExecutor {
    async fn execute(&self, request: &QueryRequest) -> Result<QueryRows, ExecutorError> {
        let body = serde_json::to_string(request)
            .map_err(|e| ExecutorError::Api(format!("encode request: {e}")))?;

        let (status, bytes) = tokio::time::timeout(self.config.timeout, self.post_json(body))
            .await
            .map_err(|_| {
                ExecutorError::Api(format!(
                    "no response from {} within {}ms",
                    self.address,
                    self.config.timeout.as_millis()
                ))
            })??;

        tracing::debug!(%status, bytes = bytes.len(), "query API responded");
        parse_envelope(status, &bytes)
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Vec<StatementResult>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    results: Vec<Row>,
    #[serde(default)]
    meta: QueryMeta,
    #[serde(default = "statement_succeeded")]
    success: bool,
}

fn statement_succeeded() -> bool {
    true
}

/// Interpret a query API response.
///
/// Database errors usually arrive with a 4xx status and a well-formed
/// envelope, so the body is parsed before the status is considered.
fn parse_envelope(status: StatusCode, bytes: &[u8]) -> Result<QueryRows, ExecutorError> {
    let envelope: Envelope = match serde_json::from_slice(bytes) {
        Ok(envelope) => envelope,
        Err(e) => {
            let body = String::from_utf8_lossy(bytes);
            return Err(ExecutorError::Api(if status.is_success() {
                format!("malformed response: {e}")
            } else {
                format!("HTTP {status}: {body}")
            }));
        }
    };

    if !envelope.success || !envelope.errors.is_empty() {
        let message = envelope
            .errors
            .into_iter()
            .map(|m| m.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(if message.is_empty() {
            ExecutorError::Api(format!("HTTP {status}: request was not successful"))
        } else {
            ExecutorError::Database(message)
        });
    }

    let Some(statement) = envelope.result.into_iter().next() else {
        return Err(ExecutorError::Api("response carried no statement result".to_owned()));
    };
    if !statement.success {
        return Err(ExecutorError::Database("statement was not successful".to_owned()));
    }

    Ok(QueryRows::new(statement.meta, statement.results))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_rejects_https_endpoints() {
        let config = RemoteConfig::new("https://api.example.com/query", None);
        assert!(matches!(
            RemoteExecutor::new(config),
            Err(ExecutorError::UnsupportedEndpoint(_))
        ));
    }

    #[test]
    fn new_rejects_relative_urls() {
        let config = RemoteConfig::new("/query", None);
        assert!(matches!(
            RemoteExecutor::new(config),
            Err(ExecutorError::UnsupportedEndpoint(_))
        ));
    }

    #[test]
    fn new_defaults_port_and_path() {
        let exec = match RemoteExecutor::new(RemoteConfig::new("http://db.internal", None)) {
            Ok(e) => e,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(exec.address, "db.internal:80");
        assert_eq!(exec.authority, "db.internal");
        assert_eq!(exec.path, "/");
    }

    #[test]
    fn envelope_success_yields_rows_and_meta() {
        let body = json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": [{
                "success": true,
                "results": [{"id": 1, "name": "ada"}],
                "meta": {"duration": 0.2, "changes": 0, "rows_read": 1, "served_by": "primary"}
            }]
        });
        let rows = match parse_envelope(StatusCode::OK, body.to_string().as_bytes()) {
            Ok(r) => r,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(rows.results.len(), 1);
        assert_eq!(rows.results[0].get("name"), Some(&json!("ada")));
        assert_eq!(rows.meta.rows_read, 1);
        assert_eq!(rows.meta.extra.get("served_by"), Some(&json!("primary")));
    }

    #[test]
    fn envelope_errors_surface_as_database_messages() {
        let body = json!({
            "success": false,
            "errors": [{"code": 7500, "message": "near \"SELEC\": syntax error"}],
            "result": []
        });
        match parse_envelope(StatusCode::BAD_REQUEST, body.to_string().as_bytes()) {
            Err(ExecutorError::Database(message)) => {
                assert_eq!(message, "near \"SELEC\": syntax error");
            }
            other => panic!("expected Database error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_reports_status() {
        match parse_envelope(StatusCode::BAD_GATEWAY, b"upstream down") {
            Err(ExecutorError::Api(message)) => {
                assert!(message.contains("502"), "status missing: {message}");
                assert!(message.contains("upstream down"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn empty_result_list_is_an_api_error() {
        let body = json!({"success": true, "errors": [], "result": []});
        assert!(matches!(
            parse_envelope(StatusCode::OK, body.to_string().as_bytes()),
            Err(ExecutorError::Api(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_envelope_bytes_never_panic(
            status in 100u16..600,
            bytes in proptest::collection::vec(proptest::num::u8::ANY, 0..512),
        ) {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
            let _ = parse_envelope(status, &bytes);
        }
    }
}
