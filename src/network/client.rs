//! HTTP client wrapper - executes normalized requests with reqwest

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::Value;

use crate::constants::USER_AGENT;
use crate::models::{HttpMethod, RequestBody};
use crate::network::executor::{NormalizedRequest, RawResponse, RequestExecutor, TransportError};
use crate::pairs::KeyValueList;

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::GET => Method::GET,
        HttpMethod::POST => Method::POST,
        HttpMethod::PUT => Method::PUT,
        HttpMethod::DELETE => Method::DELETE,
        HttpMethod::PATCH => Method::PATCH,
        HttpMethod::HEAD => Method::HEAD,
        HttpMethod::OPTIONS => Method::OPTIONS,
    }
}

/// Parse the URL and append query params after any already in it
fn build_url(request: &NormalizedRequest) -> Result<Url, TransportError> {
    let mut url = Url::parse(&request.url)
        .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", e, request.url)))?;
    if !request.params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in &request.params {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

/// JSON if it parses, else UTF-8 text, else nothing
fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(json) => Some(json),
        Err(_) => std::str::from_utf8(bytes)
            .ok()
            .map(|text| Value::String(text.to_string())),
    }
}

fn map_error(error: reqwest::Error, timeout_ms: u64) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout { timeout_ms }
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Other(format!("Request failed: {}", error))
    }
}

/// Default executor backed by a shared `reqwest::Client`
#[derive(Clone, Debug)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        ReqwestExecutor { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestExecutor { client }
    }

    fn build_request(&self, request: &NormalizedRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let url = build_url(request)?;
        let mut req_builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .timeout(request.timeout);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        req_builder = match &request.body {
            RequestBody::Absent => req_builder,
            RequestBody::Raw(text) => req_builder.body(text.clone()),
            RequestBody::Structured(value) => req_builder.json(value),
        };

        Ok(req_builder)
    }
}

impl Default for ReqwestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(&self, request: NormalizedRequest) -> Result<RawResponse, TransportError> {
        let timeout_ms = request.timeout.as_millis() as u64;
        let req_builder = self.build_request(&request)?;

        let start = Instant::now();
        let resp = req_builder
            .send()
            .await
            .map_err(|e| map_error(e, timeout_ms))?;

        let status = resp.status().as_u16();
        let mut headers = KeyValueList::new();
        for (key, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str(), v);
            }
        }

        let bytes = resp.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { timeout_ms }
            } else {
                TransportError::Body(e.to_string())
            }
        })?;
        let elapsed = start.elapsed().as_millis() as u64;

        Ok(RawResponse {
            status,
            headers,
            body: decode_body(&bytes),
            elapsed_ms: Some(elapsed),
            size_bytes: bytes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn normalized(url: &str) -> NormalizedRequest {
        NormalizedRequest {
            url: url.to_string(),
            method: HttpMethod::GET,
            headers: Vec::new(),
            params: Vec::new(),
            body: RequestBody::Absent,
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(to_reqwest_method(HttpMethod::HEAD), Method::HEAD);
        assert_eq!(to_reqwest_method(HttpMethod::OPTIONS), Method::OPTIONS);
        assert_eq!(to_reqwest_method(HttpMethod::PATCH), Method::PATCH);
    }

    #[test]
    fn test_build_url_appends_params() {
        let mut req = normalized("https://api.example.com/items?sort=asc");
        req.params = vec![("page".into(), "2".into()), ("q".into(), "a b".into())];
        let url = build_url(&req).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?sort=asc&page=2&q=a+b");
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        let err = build_url(&normalized("not a url")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(br#"{"id":1}"#), Some(json!({"id": 1})));
        assert_eq!(decode_body(b"hello"), Some(json!("hello")));
        assert_eq!(decode_body(&[0xff, 0xfe]), None);
        assert_eq!(decode_body(b""), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let executor = ReqwestExecutor::new();
        let mut req = normalized("http://127.0.0.1:9/");
        req.timeout = Duration::from_secs(5);
        assert!(executor.execute(req).await.is_err());
    }

    /// Accepts connections and never answers them
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}/slow", addr)
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let executor = ReqwestExecutor::new();
        let mut req = normalized(&silent_server().await);
        req.timeout = Duration::from_millis(200);
        match executor.execute(req).await {
            Err(TransportError::Timeout { timeout_ms }) => assert_eq!(timeout_ms, 200),
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure_response() {
        use crate::models::ApiRequest;
        use crate::network::Dispatcher;

        let dispatcher = Dispatcher::new(ReqwestExecutor::new());
        let mut request = ApiRequest::new(HttpMethod::GET, silent_server().await);
        request.timeout_ms = Some(200);

        let response = dispatcher.send(&request, None).await;
        assert_eq!(response.status, 0);
        assert!(response.headers.is_empty());
        assert_eq!(response.body, Some(json!({"error": "Request timed out (200ms)"})));
        assert_eq!(response.error_message(), Some("Request timed out (200ms)"));
    }
}
