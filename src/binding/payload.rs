//! Payload serializers, selected by id from a descriptor's payload spec.

use std::sync::Arc;

use super::value::ArgValue;
use crate::registry::ComponentRegistry;
use crate::{Error, ErrorContext, Result};

/// What a serializer is asked to encode.
#[derive(Debug, Clone, Copy)]
pub enum PayloadInput<'a> {
    /// The designated argument.
    Value(&'a ArgValue),
    /// Named fields, in order, after options were merged.
    Fields(&'a [(String, String)]),
}

pub trait PayloadSerializer: Send + Sync {
    fn serialize(&self, input: PayloadInput<'_>) -> Result<Vec<u8>>;
}

pub type SerializerRegistry = ComponentRegistry<dyn PayloadSerializer>;

/// Registry holding every built-in serializer.
pub fn default_serializers() -> SerializerRegistry {
    SerializerRegistry::new("serializer")
        .with(JsonPayload::ID, Arc::new(JsonPayload))
        .with(KeyValuesPayload::ID, Arc::new(KeyValuesPayload))
        .with(FormPayload::ID, Arc::new(FormPayload))
        .with(RawPayload::ID, Arc::new(RawPayload))
}

fn payload_error(msg: impl Into<String>, serializer: &str) -> Error {
    Error::binding(msg, ErrorContext::new().with_source(serializer.to_string()))
}

/// Compact JSON.
pub struct JsonPayload;

impl JsonPayload {
    pub const ID: &'static str = "json";
}

impl PayloadSerializer for JsonPayload {
    fn serialize(&self, input: PayloadInput<'_>) -> Result<Vec<u8>> {
        let value = match input {
            PayloadInput::Value(v) => v.as_json(),
            PayloadInput::Fields(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
            ),
        };
        serde_json::to_vec(&value).map_err(|e| payload_error(e.to_string(), Self::ID))
    }
}

/// Plain-text `key value` lines joined by `\n`; list values are
/// space-separated (`use production candy`).
pub struct KeyValuesPayload;

impl KeyValuesPayload {
    pub const ID: &'static str = "key_values";

    fn render(value: &serde_json::Value) -> Option<String> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Self::render)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            other => Some(other.to_string()),
        }
    }
}

impl PayloadSerializer for KeyValuesPayload {
    fn serialize(&self, input: PayloadInput<'_>) -> Result<Vec<u8>> {
        let lines: Vec<String> = match input {
            PayloadInput::Fields(fields) => {
                fields.iter().map(|(k, v)| format!("{} {}", k, v)).collect()
            }
            PayloadInput::Value(v) => match v.as_json() {
                serde_json::Value::Object(map) => map
                    .iter()
                    .filter_map(|(k, v)| Self::render(v).map(|v| format!("{} {}", k, v)))
                    .collect(),
                other => {
                    return Err(payload_error(
                        format!("key/value payload needs an object, got {}", other),
                        Self::ID,
                    ))
                }
            },
        };
        Ok(lines.join("\n").into_bytes())
    }
}

/// `application/x-www-form-urlencoded`.
pub struct FormPayload;

impl FormPayload {
    pub const ID: &'static str = "form";
}

impl PayloadSerializer for FormPayload {
    fn serialize(&self, input: PayloadInput<'_>) -> Result<Vec<u8>> {
        let pairs: Vec<(String, String)> = match input {
            PayloadInput::Fields(fields) => fields.to_vec(),
            PayloadInput::Value(v) => match v.as_json() {
                serde_json::Value::Object(map) => map
                    .iter()
                    .filter_map(|(k, v)| {
                        ArgValue::Json(v.clone())
                            .to_wire_string()
                            .map(|s| (k.clone(), s))
                    })
                    .collect(),
                other => {
                    return Err(payload_error(
                        format!("form payload needs an object, got {}", other),
                        Self::ID,
                    ))
                }
            },
        };
        Ok(pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
            .into_bytes())
    }
}

/// The argument's text as-is.
pub struct RawPayload;

impl RawPayload {
    pub const ID: &'static str = "raw";
}

impl PayloadSerializer for RawPayload {
    fn serialize(&self, input: PayloadInput<'_>) -> Result<Vec<u8>> {
        match input {
            PayloadInput::Value(v) => v
                .to_wire_string()
                .map(String::into_bytes)
                .ok_or_else(|| payload_error("raw payload argument is null", Self::ID)),
            PayloadInput::Fields(_) => Err(payload_error(
                "raw payload cannot be built from fields",
                Self::ID,
            )),
        }
    }
}
