//! Polling for asynchronous remote state with backoff.
//!
//! Every "wait until the VM is Running", "wait until the upload finished" and
//! "wait for the async job" loop goes through [`wait_until`].

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for polling with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay after the first unsuccessful check.
    pub initial_delay: Duration,
    /// Cap for the growing delay.
    pub max_delay: Duration,
    /// Growth factor between checks; 1.0 polls at a fixed interval.
    pub factor: f32,
    /// Maximum total time to wait.
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            factor: 1.5,
            timeout: Duration::from_secs(600),
        }
    }
}

impl WaitConfig {
    /// Poll every `interval` until `timeout`.
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            initial_delay: interval,
            max_delay: interval,
            factor: 1.0,
            timeout,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Errors from [`wait_until`].
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// The condition did not hold before the timeout.
    #[error("timed out after {elapsed:?} waiting for {what} ({attempts} checks)")]
    Timeout {
        what: String,
        elapsed: Duration,
        attempts: u32,
    },

    /// The check itself failed; waiting stops immediately.
    #[error("{0}")]
    Check(E),
}

impl<E> WaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Poll `check` until it yields a value.
///
/// `check` returns `Ok(Some(value))` when the condition holds, `Ok(None)` to
/// keep waiting, and `Err` to abort. The first check runs immediately.
pub async fn wait_until<T, E, F, Fut>(
    config: &WaitConfig,
    what: &str,
    mut check: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    let mut delays = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(config.factor)
        .build();

    loop {
        attempts += 1;

        match check().await {
            Ok(Some(value)) => {
                debug!(what = %what, attempts, "Condition met");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(what = %what, attempts, error = %e, "Check failed");
                return Err(WaitError::Check(e));
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Err(WaitError::Timeout {
                what: what.to_string(),
                elapsed,
                attempts,
            });
        }

        let delay = delays
            .next()
            .unwrap_or(config.max_delay)
            .min(config.timeout - elapsed);
        debug!(
            what = %what,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "Not ready, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_returns_when_ready() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let config = WaitConfig::fixed(Duration::from_secs(5), Duration::from_secs(60));

        let state = wait_until(&config, "vm running", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok::<_, String>((n >= 3).then_some("Running"))
        })
        .await
        .unwrap();

        assert_eq!(state, "Running");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let config = WaitConfig::fixed(Duration::from_secs(10), Duration::from_secs(30));

        let err = wait_until(&config, "upload", || async { Ok::<Option<()>, String>(None) })
            .await
            .unwrap_err();

        match err {
            WaitError::Timeout { what, attempts, .. } => {
                assert_eq!(what, "upload");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_stops_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let config = WaitConfig::default();

        let err = wait_until(&config, "job", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<Option<()>, _>("job failed".to_string())
        })
        .await
        .unwrap_err();

        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "job failed");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
