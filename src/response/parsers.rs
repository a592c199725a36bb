//! Built-in response parsers.

use serde_json::{Map, Value};

use super::{Resolution, ResponseParser};
use crate::transport::RawResponse;
use crate::{Error, ErrorContext, Result};

/// Body as JSON; an empty body is absence.
pub struct Json;

impl Json {
    pub const ID: &'static str = "json";
}

impl ResponseParser for Json {
    fn parse(&self, response: &RawResponse) -> Result<Resolution> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Resolution::Absent);
        }
        serde_json::from_slice(&response.body)
            .map(Resolution::Value)
            .map_err(|e| {
                Error::parse(
                    e.to_string(),
                    ErrorContext::new()
                        .with_source(Self::ID)
                        .with_details(format!("status {}", response.status)),
                )
            })
    }
}

/// Body as one string.
pub struct PlainText;

impl PlainText {
    pub const ID: &'static str = "plain_text";
}

impl ResponseParser for PlainText {
    fn parse(&self, response: &RawResponse) -> Result<Resolution> {
        Ok(Resolution::Value(Value::String(response.text())))
    }
}

/// Non-blank lines, trimmed, first occurrence kept.
pub struct SplitNewlines;

impl SplitNewlines {
    pub const ID: &'static str = "split_newlines";
}

impl ResponseParser for SplitNewlines {
    fn parse(&self, response: &RawResponse) -> Result<Resolution> {
        let text = response.text();
        let mut lines: Vec<Value> = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let line = Value::String(line.to_string());
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
        Ok(Resolution::Value(Value::Array(lines)))
    }
}

/// `key value` records separated by blank lines.
fn key_value_records(text: &str) -> Vec<Map<String, Value>> {
    let mut records = Vec::new();
    let mut current = Map::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }
        let (key, value) = match line.split_once(char::is_whitespace) {
            Some((k, v)) => (k, v.trim()),
            None => (line, ""),
        };
        current.insert(key.to_string(), Value::String(value.to_string()));
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

/// First key/value record as an object; no record is absence.
pub struct KeyValues;

impl KeyValues {
    pub const ID: &'static str = "key_values";
}

impl ResponseParser for KeyValues {
    fn parse(&self, response: &RawResponse) -> Result<Resolution> {
        Ok(key_value_records(&response.text())
            .into_iter()
            .next()
            .map(|m| Resolution::Value(Value::Object(m)))
            .unwrap_or(Resolution::Absent))
    }
}

/// Every key/value record, as an array of objects.
pub struct KeyValuesList;

impl KeyValuesList {
    pub const ID: &'static str = "key_values_list";
}

impl ResponseParser for KeyValuesList {
    fn parse(&self, response: &RawResponse) -> Result<Resolution> {
        Ok(Resolution::Value(Value::Array(
            key_value_records(&response.text())
                .into_iter()
                .map(Value::Object)
                .collect(),
        )))
    }
}

/// Discards the body; the call succeeds with no value.
pub struct ReleasePayload;

impl ReleasePayload {
    pub const ID: &'static str = "release_payload";
}

impl ResponseParser for ReleasePayload {
    fn parse(&self, _response: &RawResponse) -> Result<Resolution> {
        Ok(Resolution::Void)
    }
}
