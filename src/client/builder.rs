use std::sync::Arc;

use tracing::info;

use crate::binding::{default_serializers, Binder, PayloadSerializer, SerializerRegistry};
use crate::client::config::ClientConfig;
use crate::client::core::RestClient;
use crate::descriptor::{ApiManifest, DescriptorRegistry, RequestDescriptor};
use crate::dispatch::Dispatcher;
use crate::filter::{
    default_filters, Clock, CredentialStore, Credentials, FilterChain, FilterRegistry,
    RequestFilter, SystemClock,
};
use crate::resilience::{RetryOnTimeout, RetryPolicy};
use crate::response::{
    default_mappers, default_parsers, ExceptionMapper, MapperRegistry, ParserRegistry,
    ResponseParser, ResponseResolver,
};
use crate::transport::{HttpTransport, Transport};
use crate::{Error, ErrorContext, Result};

/// Builder for [`RestClient`].
///
/// Environment overrides (applied on `build`):
/// - `CLOUD_HTTP_TIMEOUT_SECS` (default 30)
/// - `CLOUD_HTTP_POOL_MAX_IDLE_PER_HOST` (default 32)
/// - `CLOUD_PROXY_URL`
/// - `CLOUD_RETRY_MAX_ATTEMPTS` (default 3)
pub struct RestClientBuilder {
    endpoint: Option<String>,
    descriptors: Vec<RequestDescriptor>,
    manifests: Vec<ApiManifest>,
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    credentials: CredentialStore,
    clock: Arc<dyn Clock>,
    serializers: SerializerRegistry,
    filters: FilterRegistry,
    parsers: ParserRegistry,
    mappers: MapperRegistry,
    retry_policy: Option<RetryPolicy>,
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RestClientBuilder {
    pub fn new() -> Self {
        Self {
            endpoint: None,
            descriptors: Vec::new(),
            manifests: Vec::new(),
            config: ClientConfig::default(),
            transport: None,
            credentials: CredentialStore::new(),
            clock: Arc::new(SystemClock),
            serializers: default_serializers(),
            filters: default_filters(),
            parsers: default_parsers(),
            mappers: default_mappers(),
            retry_policy: None,
        }
    }

    /// Base endpoint that relative paths are appended to.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn descriptor(mut self, descriptor: RequestDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn descriptors(mut self, descriptors: impl IntoIterator<Item = RequestDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Register a manifest's operations. Its endpoint is used when none is set
    /// explicitly.
    pub fn manifest(mut self, manifest: ApiManifest) -> Self {
        self.manifests.push(manifest);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default reqwest transport (tests, custom stacks).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credentials(self, credentials: Credentials) -> Self {
        self.credentials.refresh(credentials);
        self
    }

    /// Share an existing credential slot.
    pub fn credential_store(mut self, store: CredentialStore) -> Self {
        self.credentials = store;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn serializer(mut self, id: impl Into<String>, s: Arc<dyn PayloadSerializer>) -> Self {
        self.serializers.register(id, s);
        self
    }

    pub fn filter(mut self, id: impl Into<String>, f: Arc<dyn RequestFilter>) -> Self {
        self.filters.register(id, f);
        self
    }

    pub fn parser(mut self, id: impl Into<String>, p: Arc<dyn ResponseParser>) -> Self {
        self.parsers.register(id, p);
        self
    }

    pub fn exception_mapper(mut self, id: impl Into<String>, m: Arc<dyn ExceptionMapper>) -> Self {
        self.mappers.register(id, m);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Build the client. Every component id a descriptor names must resolve.
    pub fn build(self) -> Result<RestClient> {
        let config = self.config.with_env_overrides();

        let mut registry = DescriptorRegistry::new();
        let mut manifest_endpoint = None;
        for manifest in &self.manifests {
            registry.extend(DescriptorRegistry::from_manifest(manifest)?)?;
            if manifest_endpoint.is_none() {
                manifest_endpoint = manifest.endpoint.clone();
            }
        }
        for descriptor in self.descriptors {
            registry.register(descriptor)?;
        }

        let endpoint = self
            .endpoint
            .or(config.endpoint.clone())
            .or(manifest_endpoint);
        let endpoint = match endpoint {
            Some(e) => e,
            None => {
                if let Some(d) = registry.operations().find(|d| d.endpoint_arg.is_none()) {
                    return Err(Error::configuration(
                        "no endpoint configured",
                        ErrorContext::new()
                            .with_operation(d.operation.clone())
                            .with_details("set one on the builder, the config or the manifest")
                            .with_source("client_builder"),
                    ));
                }
                String::new()
            }
        };
        if !endpoint.is_empty() {
            url::Url::parse(&endpoint).map_err(|e| {
                Error::configuration(
                    format!("invalid endpoint '{}': {}", endpoint, e),
                    ErrorContext::new().with_source("client_builder"),
                )
            })?;
        }

        let resolver = ResponseResolver::new(self.parsers, self.mappers);
        for d in registry.operations() {
            resolver.validate(d)?;
            FilterChain::resolve(&d.filters, &self.filters, &d.operation)?;
            if let Some(payload) = &d.payload {
                self.serializers.resolve(&payload.serializer, &d.operation)?;
            }
        }

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::with_config(&config.http)?),
        };

        let retry_policy = self.retry_policy.unwrap_or_else(|| match config.retry_max_attempts {
            Some(n) => RetryPolicy::new().with_max_attempts(n),
            None => RetryPolicy::new(),
        });

        info!(
            endpoint = %endpoint,
            operations = registry.len(),
            retry_max_attempts = retry_policy.max_attempts,
            "rest client built"
        );

        Ok(RestClient {
            registry: Arc::new(registry),
            binder: Binder::new(endpoint, self.serializers),
            filters: Arc::new(self.filters),
            dispatcher: Dispatcher::new(transport),
            resolver: Arc::new(resolver),
            credentials: self.credentials,
            clock: self.clock,
            retry: RetryOnTimeout::new(retry_policy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn test_unknown_component_rejected_at_build() {
        let d = RequestDescriptor::builder("drives.list", Method::GET)
            .path("/drives/list")
            .filter("kerberos")
            .build()
            .unwrap();
        let err = RestClientBuilder::new()
            .endpoint("https://api.example.com")
            .descriptor(d)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Descriptor(_)));
        assert!(err.to_string().contains("kerberos"));
    }

    #[test]
    fn test_endpoint_required_for_relative_operations() {
        let d = RequestDescriptor::builder("drives.list", Method::GET)
            .path("/drives/list")
            .build()
            .unwrap();
        let err = RestClientBuilder::new().descriptor(d).build().err().unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_manifest_endpoint_used() {
        let manifest = ApiManifest::from_yaml_str(
            "id: sigma\nendpoint: https://api.cloudsigma.com\noperations:\n  - id: drives.list\n    path: /drives/list\n",
        )
        .unwrap();
        let client = RestClientBuilder::new().manifest(manifest).build().unwrap();
        assert_eq!(client.endpoint(), "https://api.cloudsigma.com");
        assert_eq!(client.registry().len(), 1);
    }
}
