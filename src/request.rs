//! The bound request: a concrete, transmittable HTTP request built for one
//! invocation and owned exclusively by that call.

use bytes::Bytes;
use reqwest::Method;

use crate::binding::encoding::encode_component;

/// Ordered header multimap.
///
/// Names keep the casing they were declared with; lookups compare names
/// case-insensitively as HTTP does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace every value of `name` with a single one. The first existing
    /// entry keeps its position; with none, the header is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut replaced = false;
        self.entries.retain_mut(|(n, v)| {
            if !n.eq_ignore_ascii_case(&name) {
                return true;
            }
            if replaced {
                return false;
            }
            *v = value.clone();
            replaced = true;
            true
        });
        if !replaced {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before != self.entries.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered, decoded query parameters. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Last-write-wins: the first entry for `key` takes the new value in place
    /// and later duplicates are dropped.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut replaced = false;
        self.entries.retain_mut(|(k, v)| {
            if *k != key {
                return true;
            }
            if replaced {
                return false;
            }
            *v = value.clone();
            replaced = true;
            true
        });
        if !replaced {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        before != self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `k=v&k2=v2` with every key and value percent-encoded except `skip`.
    pub fn encode(&self, skip: &[char]) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k, skip), encode_component(v, skip)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Request body with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub data: Bytes,
    pub content_type: String,
    pub content_length: Option<u64>,
}

impl Payload {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let data = data.into();
        let content_length = Some(data.len() as u64);
        Self {
            data,
            content_type: content_type.into(),
            content_length,
        }
    }

    /// The body as text, when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// A concrete request produced by binding a descriptor to arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRequest {
    pub operation: String,
    pub method: Method,
    /// Absolute URI without the query string, already encoded.
    pub endpoint: String,
    pub query: QueryParams,
    pub headers: Headers,
    pub payload: Option<Payload>,
    /// Filter ids copied from the descriptor.
    pub filters: Vec<String>,
    /// Characters left literal when the query string is rendered.
    pub skip_encoding: Vec<char>,
}

impl BoundRequest {
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            self.endpoint.clone()
        } else {
            format!("{}?{}", self.endpoint, self.query.encode(&self.skip_encoding))
        }
    }

    /// `GET https://host/path?q=1 HTTP/1.1`
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method, self.uri())
    }

    /// Every header except the payload's own, one `Name: value\n` line each.
    pub fn non_payload_headers(&self) -> String {
        self.headers
            .iter()
            .filter(|(n, _)| {
                !n.eq_ignore_ascii_case("content-type") && !n.eq_ignore_ascii_case("content-length")
            })
            .map(|(n, v)| format!("{}: {}\n", n, v))
            .collect()
    }

    pub fn payload_str(&self) -> Option<&str> {
        self.payload.as_ref().and_then(Payload::as_str)
    }
}
