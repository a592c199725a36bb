//! Built-in exception mappers.
//!
//! A mapper sees every failure of an operation that declares it, except
//! cancellation. Returning `Ok` turns the failure into a normal result.

use serde_json::Value;

use super::{ExceptionMapper, Resolution};
use crate::{Error, Result};

/// 404 means the resource is absent.
pub struct NullOnNotFound;

impl NullOnNotFound {
    pub const ID: &'static str = "null_on_not_found";
}

impl ExceptionMapper for NullOnNotFound {
    fn map(&self, failure: Error) -> Result<Resolution> {
        if failure.is_not_found() {
            Ok(Resolution::Absent)
        } else {
            Err(failure)
        }
    }
}

/// 404 means a delete-like operation already took effect.
pub struct VoidOnNotFound;

impl VoidOnNotFound {
    pub const ID: &'static str = "void_on_not_found";
}

impl ExceptionMapper for VoidOnNotFound {
    fn map(&self, failure: Error) -> Result<Resolution> {
        if failure.is_not_found() {
            Ok(Resolution::Void)
        } else {
            Err(failure)
        }
    }
}

/// 404 means an empty collection.
pub struct EmptyOnNotFound;

impl EmptyOnNotFound {
    pub const ID: &'static str = "empty_on_not_found";
}

impl ExceptionMapper for EmptyOnNotFound {
    fn map(&self, failure: Error) -> Result<Resolution> {
        if failure.is_not_found() {
            Ok(Resolution::Value(Value::Array(Vec::new())))
        } else {
            Err(failure)
        }
    }
}

/// Classifies response faults into typed errors: 401/403 authorization,
/// 404 not found, 409 illegal state. Everything else passes through.
pub struct MapHttp4xx;

impl MapHttp4xx {
    pub const ID: &'static str = "map_http_4xx";
}

impl ExceptionMapper for MapHttp4xx {
    fn map(&self, failure: Error) -> Result<Resolution> {
        let (operation, status, body) = match failure {
            Error::ResponseFault {
                operation,
                status,
                body,
            } => (operation, status, body),
            other => return Err(other),
        };
        let message = if body.trim().is_empty() {
            operation.clone()
        } else {
            format!("{}: {}", operation, body.trim())
        };
        Err(match status {
            401 | 403 => Error::Authorization { status, message },
            404 => Error::ResourceNotFound { message },
            409 => Error::IllegalState { status, message },
            _ => Error::ResponseFault {
                operation,
                status,
                body,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(status: u16) -> Error {
        Error::ResponseFault {
            operation: "drives.info".into(),
            status,
            body: "not here".into(),
        }
    }

    #[test]
    fn test_not_found_policies_differ() {
        assert!(NullOnNotFound.map(fault(404)).unwrap().is_absent());
        assert!(VoidOnNotFound.map(fault(404)).unwrap().is_void());
        assert_eq!(
            EmptyOnNotFound.map(fault(404)).unwrap().into_value(),
            Some(Value::Array(vec![]))
        );
        assert!(matches!(
            NullOnNotFound.map(fault(500)),
            Err(Error::ResponseFault { status: 500, .. })
        ));
    }

    #[test]
    fn test_timeouts_pass_through() {
        let err = VoidOnNotFound.map(Error::timeout("slow")).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_map_http_4xx() {
        assert!(matches!(
            MapHttp4xx.map(fault(401)),
            Err(Error::Authorization { status: 401, .. })
        ));
        assert!(matches!(
            MapHttp4xx.map(fault(404)),
            Err(Error::ResourceNotFound { .. })
        ));
        assert!(matches!(
            MapHttp4xx.map(fault(409)),
            Err(Error::IllegalState { status: 409, .. })
        ));
        assert!(matches!(
            MapHttp4xx.map(fault(503)),
            Err(Error::ResponseFault { status: 503, .. })
        ));
    }
}
