use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::binding::{ArgValue, Binder, RequestOptions};
use crate::descriptor::{DescriptorRegistry, RequestDescriptor};
use crate::dispatch::{CancelHandle, DispatchHandle, Dispatcher, HandleState};
use crate::filter::{Clock, CredentialStore, FilterChain, FilterContext, FilterRegistry};
use crate::request::BoundRequest;
use crate::resilience::RetryOnTimeout;
use crate::response::{Resolution, ResponseResolver};
use crate::Result;

/// Runs operations end to end: bind, filter, dispatch, resolve.
///
/// Cheap to clone; clones share registries, transport and credentials.
#[derive(Clone)]
pub struct RestClient {
    pub(crate) registry: Arc<DescriptorRegistry>,
    pub(crate) binder: Binder,
    pub(crate) filters: Arc<FilterRegistry>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) resolver: Arc<ResponseResolver>,
    pub(crate) credentials: CredentialStore,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) retry: RetryOnTimeout,
}

impl RestClient {
    pub fn builder() -> super::RestClientBuilder {
        super::RestClientBuilder::new()
    }

    pub fn endpoint(&self) -> &str {
        self.binder.endpoint()
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// Credential slot read by filters; refresh it at any time.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn describe(&self, operation: &str) -> Result<Arc<RequestDescriptor>> {
        Ok(self.registry.describe(operation)?)
    }

    /// Bind and filter without sending.
    pub fn prepare(
        &self,
        operation: &str,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<BoundRequest> {
        let descriptor = self.describe(operation)?;
        self.prepare_with(&descriptor, args, options)
    }

    fn prepare_with(
        &self,
        descriptor: &RequestDescriptor,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<BoundRequest> {
        let bound = self.binder.bind(descriptor, args, options)?;
        let chain = FilterChain::resolve(&bound.filters, &self.filters, &descriptor.operation)?;
        let cx = FilterContext::capture(&self.credentials, self.clock.as_ref());
        chain.apply(bound, &cx)
    }

    /// Prepare and dispatch; the returned call resolves when awaited.
    pub fn submit(
        &self,
        operation: &str,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<PendingCall> {
        let descriptor = self.describe(operation)?;
        let request = self.prepare_with(&descriptor, args, options)?;
        let call_id = uuid::Uuid::new_v4();
        info!(
            call_id = %call_id,
            operation = %descriptor.operation,
            method = %request.method,
            uri = %request.uri(),
            "dispatching"
        );
        let handle = self.dispatcher.dispatch(request);
        Ok(PendingCall {
            call_id,
            handle,
            descriptor,
            resolver: self.resolver.clone(),
        })
    }

    pub async fn invoke(
        &self,
        operation: &str,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<Resolution> {
        self.submit(operation, args, options)?.wait().await
    }

    /// Invoke and deserialize; absence and void come back as `None`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<Option<T>> {
        self.invoke(operation, args, options).await?.into_typed()
    }

    /// [`invoke`](Self::invoke) re-run from binding onwards on timeout.
    pub async fn invoke_with_retry(
        &self,
        operation: &str,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<Resolution> {
        self.retry
            .execute(operation, || self.invoke(operation, args, options))
            .await
    }

    pub async fn call_with_retry<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<Option<T>> {
        self.invoke_with_retry(operation, args, options)
            .await?
            .into_typed()
    }
}

/// A dispatched call awaiting resolution.
pub struct PendingCall {
    call_id: uuid::Uuid,
    handle: DispatchHandle,
    descriptor: Arc<RequestDescriptor>,
    resolver: Arc<ResponseResolver>,
}

impl PendingCall {
    pub fn call_id(&self) -> uuid::Uuid {
        self.call_id
    }

    pub fn operation(&self) -> &str {
        &self.descriptor.operation
    }

    pub fn state(&self) -> HandleState {
        self.handle.state()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.cancel_handle()
    }

    /// Wait for the exchange and run the descriptor's parser or mapper.
    pub async fn wait(self) -> Result<Resolution> {
        let outcome = self.handle.await;
        let resolved = self.resolver.resolve(&self.descriptor, outcome);
        debug!(
            call_id = %self.call_id,
            operation = %self.descriptor.operation,
            ok = resolved.is_ok(),
            "call resolved"
        );
        resolved
    }
}
