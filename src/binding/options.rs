//! Optional-argument contributions.
//!
//! Provider option types (list filters, clone sizes, ...) build a
//! [`RequestOptions`] value; the binder applies them after the descriptor's
//! own parameters, last write winning per key.

/// Key/value contributions of one options object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    payload_fields: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((name.into(), value.to_string()));
        self
    }

    /// Field merged into a key/value payload.
    pub fn payload_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.payload_fields.push((key.into(), value.to_string()));
        self
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn payload_fields(&self) -> &[(String, String)] {
        &self.payload_fields
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.headers.is_empty() && self.payload_fields.is_empty()
    }
}
