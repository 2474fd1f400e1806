//! Dispatcher - resolves placeholders, runs the executor and normalizes the outcome
//!
//! `send` always yields an [`ApiResponse`]. Transport failures are folded into a
//! synthetic response with status `0` and an `{"error": ...}` body so callers
//! render every outcome the same way.

use std::sync::Arc;
use std::time::Instant;

use crate::models::{ApiRequest, ApiResponse, Environment, RequestBody};
use crate::network::executor::{NormalizedRequest, RawResponse, RequestExecutor};
use crate::substitute::placeholders;

/// Apply the environment to the URL, header values, param values and a raw body.
///
/// Header and param keys are left as typed. Structured bodies are not touched.
pub fn apply_environment(request: &ApiRequest, environment: &Environment) -> ApiRequest {
    let mut resolved = request.clone();
    resolved.url = environment.substitute(&request.url);
    resolved.headers = request.headers.map_values(|v| environment.substitute(v));
    resolved.params = request.params.map_values(|v| environment.substitute(v));
    if let RequestBody::Raw(text) = &request.body {
        resolved.body = RequestBody::Raw(environment.substitute(text));
    }
    resolved
}

fn log_unresolved(request: &ApiRequest) {
    let mut names = placeholders(&request.url);
    for (_, value) in request.headers.iter().chain(request.params.iter()) {
        names.extend(placeholders(value));
    }
    if let RequestBody::Raw(text) = &request.body {
        names.extend(placeholders(text));
    }
    if !names.is_empty() {
        names.sort();
        names.dedup();
        tracing::debug!(?names, "Unresolved placeholders left in request");
    }
}

/// Sends requests through an executor
pub struct Dispatcher<E> {
    executor: Arc<E>,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Dispatcher {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: RequestExecutor> Dispatcher<E> {
    pub fn new(executor: E) -> Self {
        Dispatcher {
            executor: Arc::new(executor),
        }
    }

    pub fn from_arc(executor: Arc<E>) -> Self {
        Dispatcher { executor }
    }

    /// Send `request`, resolving placeholders from `environment` when one is active.
    ///
    /// A single attempt with no retry. HTTP error statuses pass through as
    /// ordinary responses.
    pub async fn send(&self, request: &ApiRequest, environment: Option<&Environment>) -> ApiResponse {
        let resolved = match environment {
            Some(env) => apply_environment(request, env),
            None => request.clone(),
        };
        log_unresolved(&resolved);

        let normalized = NormalizedRequest::from_request(&resolved);
        tracing::info!(url = %normalized.url, method = ?normalized.method, "Executing request");

        let start = Instant::now();
        match self.executor.execute(normalized).await {
            Ok(raw) => {
                let measured = start.elapsed().as_millis() as u64;
                let response = into_response(raw, measured);
                tracing::info!(
                    status = response.status,
                    duration_ms = response.duration_ms,
                    "Request completed"
                );
                response
            }
            Err(e) => {
                tracing::warn!(error = %e, "Request failed");
                ApiResponse::failure(e.to_string())
            }
        }
    }
}

fn into_response(raw: RawResponse, measured_ms: u64) -> ApiResponse {
    ApiResponse {
        status: raw.status,
        headers: raw.headers,
        body: raw.body,
        duration_ms: raw.elapsed_ms.unwrap_or(measured_ms),
        size_bytes: raw.size_bytes,
    }
}
