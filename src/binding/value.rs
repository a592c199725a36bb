//! Positional argument values.

use serde::Serialize;
use url::Url;

use crate::{Error, ErrorContext, Result};

/// Maps an enum variant to the name the provider expects on the wire.
pub trait WireName {
    fn wire_name(&self) -> &str;
}

/// One positional argument of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// Wire name of an enum variant.
    Enum(String),
    Uri(Url),
    /// A structured value, typically a serialized domain object.
    Json(serde_json::Value),
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Serialize a domain object into an argument.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value).map(ArgValue::Json).map_err(|e| {
            Error::binding(
                format!("failed to serialize argument: {}", e),
                ErrorContext::new().with_source("arg_value"),
            )
        })
    }

    pub fn wire<E: WireName + ?Sized>(value: &E) -> Self {
        ArgValue::Enum(value.wire_name().to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null | ArgValue::Json(serde_json::Value::Null))
    }

    /// Text form used for path segments, query values and headers.
    /// `None` for null.
    pub fn to_wire_string(&self) -> Option<String> {
        match self {
            ArgValue::Null => None,
            ArgValue::Bool(b) => Some(b.to_string()),
            ArgValue::Int(i) => Some(i.to_string()),
            ArgValue::UInt(u) => Some(u.to_string()),
            ArgValue::Float(f) => Some(f.to_string()),
            ArgValue::Str(s) | ArgValue::Enum(s) => Some(s.clone()),
            ArgValue::Uri(u) => Some(u.as_str().to_string()),
            ArgValue::Json(v) => json_wire_string(v),
            ArgValue::List(items) => Some(
                items
                    .iter()
                    .filter_map(ArgValue::to_wire_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }

    pub fn as_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            ArgValue::Null => Value::Null,
            ArgValue::Bool(b) => Value::Bool(*b),
            ArgValue::Int(i) => Value::from(*i),
            ArgValue::UInt(u) => Value::from(*u),
            ArgValue::Float(f) => Value::from(*f),
            ArgValue::Str(s) | ArgValue::Enum(s) => Value::String(s.clone()),
            ArgValue::Uri(u) => Value::String(u.as_str().to_string()),
            ArgValue::Json(v) => v.clone(),
            ArgValue::List(items) => Value::Array(items.iter().map(ArgValue::as_json).collect()),
        }
    }
}

fn json_wire_string(v: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(json_wire_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(v.to_string()),
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i32> for ArgValue {
    fn from(i: i32) -> Self {
        ArgValue::Int(i.into())
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        ArgValue::Int(i)
    }
}

impl From<u32> for ArgValue {
    fn from(u: u32) -> Self {
        ArgValue::UInt(u.into())
    }
}

impl From<u64> for ArgValue {
    fn from(u: u64) -> Self {
        ArgValue::UInt(u)
    }
}

impl From<f64> for ArgValue {
    fn from(f: f64) -> Self {
        ArgValue::Float(f)
    }
}

impl From<Url> for ArgValue {
    fn from(u: Url) -> Self {
        ArgValue::Uri(u)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(v: serde_json::Value) -> Self {
        ArgValue::Json(v)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ArgValue::Null)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(v: Vec<T>) -> Self {
        ArgValue::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    enum ExtractMode {
        HttpDownload,
        FtpUpload,
    }

    impl WireName for ExtractMode {
        fn wire_name(&self) -> &str {
            match self {
                ExtractMode::HttpDownload => "HTTP_DOWNLOAD",
                ExtractMode::FtpUpload => "FTP_UPLOAD",
            }
        }
    }

    #[test]
    fn test_wire_strings() {
        assert_eq!(ArgValue::from(42i64).to_wire_string().as_deref(), Some("42"));
        assert_eq!(ArgValue::from(true).to_wire_string().as_deref(), Some("true"));
        assert_eq!(
            ArgValue::wire(&ExtractMode::FtpUpload).to_wire_string().as_deref(),
            Some("FTP_UPLOAD")
        );
        assert_eq!(
            ArgValue::from(vec![1i64, 2, 3]).to_wire_string().as_deref(),
            Some("1,2,3")
        );
        assert_eq!(ArgValue::from(None::<String>).to_wire_string(), None);
        assert_eq!(
            ArgValue::wire(&ExtractMode::HttpDownload),
            ArgValue::Enum("HTTP_DOWNLOAD".to_string())
        );
    }

    #[test]
    fn test_json_null_counts_as_null() {
        assert!(ArgValue::Json(json!(null)).is_null());
        assert!(!ArgValue::Json(json!({"name": "foo"})).is_null());
    }
}
