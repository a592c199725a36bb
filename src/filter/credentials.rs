//! Credentials and time sources read by filters.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

/// Identity and secret of one account, plus an optional session token.
pub struct Credentials {
    identity: String,
    secret: SecretString,
    token: Option<SecretString>,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: SecretString::from(secret.into()),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Shared, concurrently refreshable credential slot.
///
/// Readers take an `Arc` snapshot; a refresh swaps the pointer and never
/// touches a snapshot already handed out.
#[derive(Clone, Default)]
pub struct CredentialStore {
    current: Arc<ArcSwapOption<Credentials>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        let store = Self::new();
        store.refresh(credentials);
        store
    }

    pub fn snapshot(&self) -> Option<Arc<Credentials>> {
        self.current.load_full()
    }

    pub fn refresh(&self, credentials: Credentials) {
        tracing::debug!(identity = %credentials.identity(), "credentials refreshed");
        self.current.store(Some(Arc::new(credentials)));
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    pub fn is_set(&self) -> bool {
        self.current.load().is_some()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("credentials", &self.snapshot())
            .finish()
    }
}

/// Source of "now" for time-dependent filters.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
