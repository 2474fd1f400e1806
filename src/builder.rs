//! Request editing - pure transformations applied as the user edits a request

use serde_json::Value;

use crate::models::{ApiRequest, HttpMethod, RequestBody};

/// Interpret body editor text.
///
/// Valid JSON becomes a structured body (a JSON string literal becomes a raw
/// body holding that string), anything else is kept verbatim. Blank text means
/// no body. This never fails.
pub fn parse_body_text(text: &str) -> RequestBody {
    if text.trim().is_empty() {
        return RequestBody::Absent;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => RequestBody::from(value),
        Err(_) => RequestBody::Raw(text.to_string()),
    }
}

impl ApiRequest {
    // ========================
    // Method & URL
    // ========================

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    pub fn cycle_method(&mut self) {
        self.method = self.method.next();
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    // ========================
    // Query params
    // ========================

    pub fn add_param(&mut self) {
        self.params.add_blank();
    }

    /// Edit the param row at `index`; see [`crate::pairs::KeyValueList::edit`]
    pub fn edit_param(&mut self, index: usize, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.params.edit(index, key, value)
    }

    pub fn remove_param(&mut self, index: usize) {
        self.params.remove(index);
    }

    // ========================
    // Headers
    // ========================

    pub fn add_header(&mut self) {
        self.headers.add_blank();
    }

    /// Edit the header row at `index`; see [`crate::pairs::KeyValueList::edit`]
    pub fn edit_header(&mut self, index: usize, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.headers.edit(index, key, value)
    }

    pub fn remove_header(&mut self, index: usize) {
        self.headers.remove(index);
    }

    // ========================
    // Body
    // ========================

    pub fn set_body_text(&mut self, text: &str) {
        self.body = parse_body_text(text);
    }

    pub fn body_text(&self) -> String {
        self.body.display_text()
    }

    // ========================
    // Validation
    // ========================

    /// Whether the send action should be enabled
    pub fn is_sendable(&self) -> bool {
        !self.url.is_empty()
    }
}
