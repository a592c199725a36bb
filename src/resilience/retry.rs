//! Bounded retry for timeout-classified failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::Error;
use crate::Result;

/// Bound and predicate for [`RetryOnTimeout`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// Which failures are retried.
    pub retry_if: fn(&Error) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
            retry_if: Error::is_timeout,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// At least one attempt is always made.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_retry_if(mut self, predicate: fn(&Error) -> bool) -> Self {
        self.retry_if = predicate;
        self
    }

    pub fn should_retry(&self, error: &Error) -> bool {
        (self.retry_if)(error)
    }
}

/// Re-runs a whole operation while it fails with a timeout.
///
/// Non-timeout failures return on first occurrence. When every attempt
/// times out, the last timeout is returned.
#[derive(Debug, Clone, Default)]
pub struct RetryOnTimeout {
    policy: RetryPolicy,
}

impl RetryOnTimeout {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `operation` labels the retry log lines.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max && self.policy.should_retry(&error) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = max,
                        error = %error,
                        "timed out, retrying"
                    );
                    attempt += 1;
                    if !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Synchronous form for blocking suppliers.
    pub fn execute_blocking<F, T>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match attempt_fn() {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max && self.policy.should_retry(&error) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = max,
                        error = %error,
                        "timed out, retrying"
                    );
                    attempt += 1;
                    if !self.policy.delay.is_zero() {
                        std::thread::sleep(self.policy.delay);
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_always_timeout_runs_three_times() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryOnTimeout::default()
            .execute("drives.list", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Error::timeout(format!("attempt {}", n)))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("attempt 3"));
    }

    #[tokio::test]
    async fn test_non_timeout_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryOnTimeout::default()
            .execute("drives.list", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Cancelled)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let result = RetryOnTimeout::default()
            .execute("drives.list", || async {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(Error::timeout("slow")),
                    _ => Ok("ok"),
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_blocking_form_and_custom_bound() {
        let mut calls = 0;
        let retry = RetryOnTimeout::new(RetryPolicy::new().with_max_attempts(5));
        let result: Result<()> = retry.execute_blocking("drives.list", || {
            calls += 1;
            Err(Error::timeout("slow"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 5);

        let mut calls = 0;
        let once = RetryOnTimeout::new(RetryPolicy::new().with_max_attempts(0));
        let _ = once.execute_blocking("drives.list", || -> Result<()> {
            calls += 1;
            Err(Error::timeout("slow"))
        });
        assert_eq!(calls, 1);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_retry_log_names_operation() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut calls = 0;
        tracing::subscriber::with_default(subscriber, || {
            let _ = RetryOnTimeout::default().execute_blocking("iso.getISO", || -> Result<()> {
                calls += 1;
                Err(Error::timeout("slow"))
            });
        });
        assert_eq!(calls, 3);

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().filter(|l| l.contains("timed out, retrying")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines
            .iter()
            .all(|l| l.contains("operation=") && l.contains("iso.getISO")));
        assert!(lines[0].contains("attempt=1"));
        assert!(lines[1].contains("attempt=2"));
    }
}
