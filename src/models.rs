use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::constants::DEFAULT_TIMEOUT_MS;
use crate::pairs::KeyValueList;
use crate::substitute::substitute;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
        HttpMethod::PATCH,
        HttpMethod::HEAD,
        HttpMethod::OPTIONS,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }

    /// Next method in selector order, wrapping around
    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::PUT,
            HttpMethod::PUT => HttpMethod::DELETE,
            HttpMethod::DELETE => HttpMethod::PATCH,
            HttpMethod::PATCH => HttpMethod::HEAD,
            HttpMethod::HEAD => HttpMethod::OPTIONS,
            HttpMethod::OPTIONS => HttpMethod::GET,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unsupported HTTP method: {}", s))
    }
}

/// Request payload.
///
/// Stored as a JSON string for `Raw`, any other JSON value for `Structured`,
/// and omitted entirely when `Absent`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Absent,
    Raw(String),
    Structured(Value),
}

impl RequestBody {
    pub fn is_absent(&self) -> bool {
        matches!(self, RequestBody::Absent)
    }

    /// Text shown in the body editor
    pub fn display_text(&self) -> String {
        match self {
            RequestBody::Absent => String::new(),
            RequestBody::Raw(text) => text.clone(),
            RequestBody::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RequestBody::Absent,
            Value::String(text) => RequestBody::Raw(text),
            other => RequestBody::Structured(other),
        }
    }
}

impl Serialize for RequestBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RequestBody::Absent => serializer.serialize_none(),
            RequestBody::Raw(text) => serializer.serialize_str(text),
            RequestBody::Structured(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RequestBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(RequestBody::from)
    }
}

/// A request template as composed in the editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: KeyValueList,
    #[serde(default)]
    pub params: KeyValueList,
    #[serde(default, skip_serializing_if = "RequestBody::is_absent")]
    pub body: RequestBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ApiRequest {
    fn default() -> Self {
        ApiRequest {
            url: String::new(),
            method: HttpMethod::GET,
            headers: KeyValueList::new(),
            params: KeyValueList::new(),
            body: RequestBody::Absent,
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        ApiRequest {
            url: url.into(),
            method,
            ..ApiRequest::default()
        }
    }

    /// Timeout to honor when dispatching
    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.filter(|t| *t > 0).unwrap_or(DEFAULT_TIMEOUT_MS)
    }
}

/// Normalized response, either from the wire or a synthetic failure
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// `0` marks a client-side failure, never a real HTTP status
    pub status: u16,
    pub headers: KeyValueList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub duration_ms: u64,
    pub size_bytes: u64,
}

impl ApiResponse {
    /// Response standing in for a transport failure
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            status: 0,
            headers: KeyValueList::new(),
            body: Some(serde_json::json!({ "error": message.into() })),
            duration_ms: 0,
            size_bytes: 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == 0
    }

    /// Message carried by a synthetic failure response
    pub fn error_message(&self) -> Option<&str> {
        if !self.is_failure() {
            return None;
        }
        self.body.as_ref()?.get("error")?.as_str()
    }
}

/// Named set of variables used for `{{placeholder}}` interpolation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub variables: KeyValueList,
}

impl Environment {
    /// New unsaved environment; the id is assigned on first save
    pub fn new(name: impl Into<String>) -> Self {
        Environment {
            id: String::new(),
            name: name.into(),
            variables: KeyValueList::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key)
    }

    /// Variables as a lookup map
    pub fn variables(&self) -> HashMap<String, String> {
        self.variables.to_map()
    }

    /// Substitutes {{variable}} patterns in text
    pub fn substitute(&self, text: &str) -> String {
        substitute(text, &self.variables)
    }
}

/// A request stored inside a collection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedRequest {
    pub id: String,
    pub name: String,
    pub request: ApiRequest,
}

/// A collection of requests
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestCollection {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub requests: Vec<SavedRequest>,
}

impl RequestCollection {
    pub fn new(name: impl Into<String>) -> Self {
        RequestCollection {
            id: String::new(),
            name: name.into(),
            requests: Vec::new(),
        }
    }

    pub fn request(&self, id: &str) -> Option<&SavedRequest> {
        self.requests.iter().find(|r| r.id == id)
    }
}

/// History entry
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub request: ApiRequest,
    pub response: ApiResponse,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
