//! Single-resolution handle for one in-flight exchange.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::transport::{RawResponse, TransportError};
use crate::{Error, Result};

/// Observable lifecycle of a [`DispatchHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

impl HandleState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, HandleState::Pending)
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => HandleState::Succeeded,
            2 => HandleState::Failed,
            3 => HandleState::Cancelled,
            _ => HandleState::Pending,
        }
    }
}

/// State cell allowing exactly one transition out of `Pending`.
#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn get(&self) -> HandleState {
        HandleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Returns true for the one caller that moved the cell out of `Pending`.
    pub(crate) fn settle(&self, to: HandleState) -> bool {
        let target = match to {
            HandleState::Pending => return false,
            HandleState::Succeeded => 1,
            HandleState::Failed => 2,
            HandleState::Cancelled => 3,
        };
        self.0
            .compare_exchange(0, target, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Cloneable cancellation side of a handle.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    operation: Arc<str>,
    token: CancellationToken,
    state: Arc<StateCell>,
}

impl CancelHandle {
    /// Stop waiting for the result. Idempotent; a no-op once settled.
    pub fn cancel(&self) {
        if self.state.settle(HandleState::Cancelled) {
            debug!(operation = %self.operation, "dispatch cancelled");
            self.token.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.get() == HandleState::Cancelled
    }
}

/// Resolves to the raw response or a single terminal error.
///
/// A handle cancelled while pending resolves to [`Error::Cancelled`]; any
/// network I/O already issued is left to finish on its own.
#[derive(Debug)]
pub struct DispatchHandle {
    rx: Option<oneshot::Receiver<Result<RawResponse>>>,
    cancel: CancelHandle,
}

impl DispatchHandle {
    pub(crate) fn new(
        operation: &str,
        rx: oneshot::Receiver<Result<RawResponse>>,
        token: CancellationToken,
        state: Arc<StateCell>,
    ) -> Self {
        Self {
            rx: Some(rx),
            cancel: CancelHandle {
                operation: Arc::from(operation),
                token,
                state,
            },
        }
    }

    pub fn operation(&self) -> &str {
        &self.cancel.operation
    }

    pub fn state(&self) -> HandleState {
        self.cancel.state.get()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the outcome.
    pub async fn wait(self) -> Result<RawResponse> {
        self.await
    }
}

impl Future for DispatchHandle {
    type Output = Result<RawResponse>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() {
            this.rx = None;
            return Poll::Ready(Err(Error::Cancelled));
        }
        let Some(rx) = this.rx.as_mut() else {
            return Poll::Ready(Err(Error::Transport(TransportError::Other(
                "dispatch handle polled after resolution".to_string(),
            ))));
        };
        match Pin::new(rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(outcome) => {
                this.rx = None;
                Poll::Ready(match outcome {
                    Ok(result) => result,
                    // the task only drops its sender unsent when cancelled
                    Err(_) if this.cancel.is_cancelled() => Err(Error::Cancelled),
                    Err(_) => Err(Error::Transport(TransportError::Other(
                        "dispatch task ended without a result".to_string(),
                    ))),
                })
            }
        }
    }
}
