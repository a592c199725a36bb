//! Request filters.
//!
//! Filters run in declared order between binding and dispatch, each receiving
//! the previous one's output. They are the only stage allowed to read mutable
//! state, and that state arrives explicitly through a [`FilterContext`]
//! snapshot taken once per call.

pub mod builtin;
pub mod credentials;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::registry::ComponentRegistry;
use crate::request::BoundRequest;
use crate::{Error, ErrorContext, Result};

pub use builtin::{AuthTokenHeader, BasicAuthentication, DateHeader, QuerySigner};
pub use credentials::{Clock, CredentialStore, Credentials, FixedClock, SystemClock};

/// A request-mutating step. Applying a filter to its own output must yield a
/// request equivalent for transmission (headers replaced, never duplicated).
pub trait RequestFilter: Send + Sync {
    fn filter(&self, request: BoundRequest, cx: &FilterContext) -> Result<BoundRequest>;
}

pub type FilterRegistry = ComponentRegistry<dyn RequestFilter>;

/// Registry holding every built-in filter.
pub fn default_filters() -> FilterRegistry {
    FilterRegistry::new("filter")
        .with(BasicAuthentication::ID, Arc::new(BasicAuthentication))
        .with(AuthTokenHeader::ID, Arc::new(AuthTokenHeader))
        .with(QuerySigner::ID, Arc::new(QuerySigner))
        .with(DateHeader::ID, Arc::new(DateHeader))
}

/// State visible to filters for one application of the chain.
#[derive(Debug, Clone)]
pub struct FilterContext {
    credentials: Option<Arc<Credentials>>,
    now: DateTime<Utc>,
}

impl FilterContext {
    pub fn new(credentials: Option<Arc<Credentials>>, now: DateTime<Utc>) -> Self {
        Self { credentials, now }
    }

    /// Snapshot the store and the clock.
    pub fn capture(store: &CredentialStore, clock: &dyn Clock) -> Self {
        Self::new(store.snapshot(), clock.now())
    }

    /// Credentials for `filter`, or a filter error when none are loaded.
    pub fn credentials(&self, filter: &str) -> Result<&Credentials> {
        self.credentials.as_deref().ok_or_else(|| {
            Error::filter(
                "no credentials available",
                ErrorContext::new().with_source(filter.to_string()),
            )
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// An ordered, resolved list of filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<(String, Arc<dyn RequestFilter>)>,
}

impl FilterChain {
    /// Resolve `ids` against `registry`; an unknown id fails immediately.
    pub fn resolve(ids: &[String], registry: &FilterRegistry, operation: &str) -> Result<Self> {
        let filters = ids
            .iter()
            .map(|id| -> Result<(String, Arc<dyn RequestFilter>)> {
                Ok((id.clone(), registry.resolve(id, operation)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { filters })
    }

    pub fn push(&mut self, id: impl Into<String>, filter: Arc<dyn RequestFilter>) {
        self.filters.push((id.into(), filter));
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn apply(&self, mut request: BoundRequest, cx: &FilterContext) -> Result<BoundRequest> {
        for (id, filter) in &self.filters {
            let operation = request.operation.clone();
            request = filter.filter(request, cx).map_err(|e| match e {
                Error::Filter { message, context } if context.operation.is_none() => {
                    Error::Filter {
                        message,
                        context: context.with_operation(operation.clone()),
                    }
                }
                other => other,
            })?;
            trace!(operation = %operation, filter = %id, "filter applied");
        }
        Ok(request)
    }
}
