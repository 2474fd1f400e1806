//! Executor capability - the boundary where actual network I/O happens

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{ApiRequest, HttpMethod, RequestBody};
use crate::pairs::KeyValueList;

/// A request ready to go on the wire: placeholders resolved, blank rows dropped
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl NormalizedRequest {
    pub fn from_request(request: &ApiRequest) -> Self {
        fn owned(list: &KeyValueList) -> Vec<(String, String)> {
            list.non_empty_keys()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        NormalizedRequest {
            url: request.url.clone(),
            method: request.method,
            headers: owned(&request.headers),
            params: owned(&request.params),
            body: request.body.clone(),
            timeout: Duration::from_millis(request.effective_timeout_ms()),
        }
    }
}

/// What the executor hands back for any completed HTTP exchange, error statuses included
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: KeyValueList,
    pub body: Option<Value>,
    /// Elapsed time as measured by the executor, if it measures one
    pub elapsed_ms: Option<u64>,
    pub size_bytes: u64,
}

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Error reading body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

/// Performs the network exchange for a normalized request
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: NormalizedRequest) -> Result<RawResponse, TransportError>;
}
