//! Asynchronous dispatch.
//!
//! [`Dispatcher::dispatch`] returns a [`DispatchHandle`] immediately; the
//! exchange runs as a task on the ambient tokio runtime. Unrelated
//! dispatches are independent and carry no ordering between them.

mod handle;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::request::BoundRequest;
use crate::transport::Transport;
use crate::{Error, ErrorContext};

pub use handle::{CancelHandle, DispatchHandle, HandleState};
use handle::StateCell;

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Submit `request` without waiting for it.
    ///
    /// Outside a tokio runtime the handle comes back already failed with a
    /// configuration error.
    pub fn dispatch(&self, request: BoundRequest) -> DispatchHandle {
        let (tx, rx) = oneshot::channel();
        let token = CancellationToken::new();
        let state = Arc::new(StateCell::default());
        let handle = DispatchHandle::new(&request.operation, rx, token.clone(), state.clone());

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(rt) => rt,
            Err(e) => {
                warn!(operation = %request.operation, "dispatch outside of a tokio runtime");
                if state.settle(HandleState::Failed) {
                    let _ = tx.send(Err(Error::configuration(
                        "dispatch requires a tokio runtime",
                        ErrorContext::new()
                            .with_operation(request.operation.clone())
                            .with_details(e.to_string())
                            .with_source("dispatcher"),
                    )));
                }
                return handle;
            }
        };

        let transport = self.transport.clone();
        runtime.spawn(async move {
            let operation = request.operation.clone();
            let started = Instant::now();
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(operation = %operation, "dispatch task stopped by cancellation");
                }
                outcome = transport.send(request) => {
                    let to = if outcome.is_ok() {
                        HandleState::Succeeded
                    } else {
                        HandleState::Failed
                    };
                    if state.settle(to) {
                        debug!(
                            operation = %operation,
                            state = ?to,
                            duration_ms = started.elapsed().as_millis() as u64,
                            "dispatch settled"
                        );
                        let _ = tx.send(outcome);
                    }
                }
            }
        });
        handle
    }
}
