//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cloud_lib_rust::request::BoundRequest;
use cloud_lib_rust::transport::{RawResponse, Transport, TransportError};
use cloud_lib_rust::{Error, Result};

pub const CLOUDSIGMA: &str = include_str!("../fixtures/cloudsigma.yaml");
pub const CLOUDSTACK: &str = include_str!("../fixtures/cloudstack.yaml");
pub const NOVA: &str = include_str!("../fixtures/nova.yaml");

/// One scripted exchange outcome.
pub enum Outcome {
    Respond(RawResponse),
    Timeout,
    Refused,
    /// Respond after sleeping.
    Delayed(Duration, RawResponse),
}

impl Outcome {
    pub fn ok(status: u16, body: &str) -> Self {
        Outcome::Respond(RawResponse::new(status, body.to_string()))
    }
}

/// Transport that replays scripted outcomes and records every request.
/// Once the script runs out it keeps answering `200` with an empty body.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    sent: Arc<Mutex<Vec<BoundRequest>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<BoundRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn shared(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: BoundRequest) -> Result<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Outcome::Respond(response)) => Ok(response),
            Some(Outcome::Timeout) => Err(Error::timeout("read timed out")),
            Some(Outcome::Refused) => Err(Error::Transport(TransportError::Other(
                "connection refused".to_string(),
            ))),
            Some(Outcome::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            None => Ok(RawResponse::new(200, String::new())),
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
