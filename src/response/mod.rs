//! Response resolution.
//!
//! A 2xx response goes through the descriptor's parser and then its unwrap
//! step. Any other status becomes [`Error::ResponseFault`] and, like
//! transport failures, is offered to the declared exception mapper. With no
//! mapper the failure propagates unchanged. Parsers and mappers are chosen by
//! id from the descriptor, never from the body.

pub mod mappers;
pub mod parsers;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::descriptor::{RequestDescriptor, Unwrap};
use crate::registry::ComponentRegistry;
use crate::transport::RawResponse;
use crate::utils::json_path;
use crate::{Error, ErrorContext, Result};

pub use mappers::{EmptyOnNotFound, MapHttp4xx, NullOnNotFound, VoidOnNotFound};
pub use parsers::{Json, KeyValues, KeyValuesList, PlainText, ReleasePayload, SplitNewlines};

/// Outcome of a resolved call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Value(Value),
    /// The resource does not exist (a mapped 404 or an empty body).
    Absent,
    /// The operation succeeded and returns nothing.
    Void,
}

impl Resolution {
    pub fn is_absent(&self) -> bool {
        matches!(self, Resolution::Absent)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Resolution::Void)
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Resolution::Value(v) => Some(v),
            Resolution::Absent | Resolution::Void => None,
        }
    }

    /// Deserialize the value; absence and void become `None`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Option<T>> {
        match self {
            Resolution::Value(v) => serde_json::from_value(v).map(Some).map_err(|e| {
                Error::parse(
                    format!("response does not match the expected type: {}", e),
                    ErrorContext::new().with_source("resolution"),
                )
            }),
            Resolution::Absent | Resolution::Void => Ok(None),
        }
    }
}

pub trait ResponseParser: Send + Sync {
    fn parse(&self, response: &RawResponse) -> Result<Resolution>;
}

pub trait ExceptionMapper: Send + Sync {
    /// Either recover a result from `failure` or return an error, possibly a
    /// more specific one.
    fn map(&self, failure: Error) -> Result<Resolution>;
}

pub type ParserRegistry = ComponentRegistry<dyn ResponseParser>;
pub type MapperRegistry = ComponentRegistry<dyn ExceptionMapper>;

pub fn default_parsers() -> ParserRegistry {
    ParserRegistry::new("parser")
        .with(Json::ID, Arc::new(Json))
        .with(PlainText::ID, Arc::new(PlainText))
        .with(SplitNewlines::ID, Arc::new(SplitNewlines))
        .with(KeyValues::ID, Arc::new(KeyValues))
        .with(KeyValuesList::ID, Arc::new(KeyValuesList))
        .with(ReleasePayload::ID, Arc::new(ReleasePayload))
}

pub fn default_mappers() -> MapperRegistry {
    MapperRegistry::new("exception mapper")
        .with(NullOnNotFound::ID, Arc::new(NullOnNotFound))
        .with(VoidOnNotFound::ID, Arc::new(VoidOnNotFound))
        .with(EmptyOnNotFound::ID, Arc::new(EmptyOnNotFound))
        .with(MapHttp4xx::ID, Arc::new(MapHttp4xx))
}

#[derive(Clone)]
pub struct ResponseResolver {
    parsers: ParserRegistry,
    mappers: MapperRegistry,
}

impl Default for ResponseResolver {
    fn default() -> Self {
        Self::new(default_parsers(), default_mappers())
    }
}

impl ResponseResolver {
    pub fn new(parsers: ParserRegistry, mappers: MapperRegistry) -> Self {
        Self { parsers, mappers }
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn mappers(&self) -> &MapperRegistry {
        &self.mappers
    }

    /// Check that the descriptor's parser and mapper ids are registered.
    pub fn validate(&self, descriptor: &RequestDescriptor) -> Result<()> {
        self.parsers
            .resolve(&descriptor.parser, &descriptor.operation)?;
        if let Some(id) = &descriptor.exception_mapper {
            self.mappers.resolve(id, &descriptor.operation)?;
        }
        Ok(())
    }

    pub fn resolve(
        &self,
        descriptor: &RequestDescriptor,
        outcome: Result<RawResponse>,
    ) -> Result<Resolution> {
        let response = match outcome {
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(failure) => return self.map_failure(descriptor, failure),
            Ok(response) => response,
        };

        if !response.is_success() {
            let fault = Error::ResponseFault {
                operation: descriptor.operation.clone(),
                status: response.status,
                body: response.text(),
            };
            return self.map_failure(descriptor, fault);
        }

        let parser = self
            .parsers
            .resolve(&descriptor.parser, &descriptor.operation)?;
        let parsed = parser.parse(&response).map_err(|e| match e {
            Error::Parse { message, context } if context.operation.is_none() => Error::Parse {
                message,
                context: context.with_operation(descriptor.operation.clone()),
            },
            other => other,
        })?;

        Ok(match (&descriptor.unwrap, parsed) {
            (Some(unwrap), Resolution::Value(v)) => unwrap_value(unwrap, v, &descriptor.operation),
            (_, parsed) => parsed,
        })
    }

    fn map_failure(&self, descriptor: &RequestDescriptor, failure: Error) -> Result<Resolution> {
        let Some(id) = &descriptor.exception_mapper else {
            return Err(failure);
        };
        let mapper = self.mappers.resolve(id, &descriptor.operation)?;
        let status = failure.status();
        let mapped = mapper.map(failure);
        if let Ok(resolution) = &mapped {
            debug!(
                operation = %descriptor.operation,
                mapper = %id,
                status = ?status,
                resolution = ?resolution,
                "failure mapped to a result"
            );
        }
        mapped
    }
}

fn unwrap_value(unwrap: &Unwrap, value: Value, operation: &str) -> Resolution {
    let inner = match unwrap {
        Unwrap::Path(path) => json_path::get_path(&value, path).cloned(),
        Unwrap::Depth(depth) => Some(json_path::descend(value, *depth)),
    };
    match inner {
        Some(Value::Null) | None => {
            debug!(operation = %operation, "unwrapped element missing");
            Resolution::Absent
        }
        Some(v) => Resolution::Value(v),
    }
}
