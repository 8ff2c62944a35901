//! Retry loop with cancellation checkpoints.
//!
//! Attempts run strictly one after another. Cancellation is checked before
//! every attempt and again before every inter-retry delay.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cancel::CancelCheck;

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(1, Duration::from_secs(2))
    }
}

impl RetryConfig {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// How a retried operation ended
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Completed(T),
    Cancelled,
    /// Every attempt failed; carries the last error
    Exhausted(E),
}

/// Run `operation` until it succeeds, the attempts run out, or cancellation
/// is observed at a checkpoint.
pub async fn retry_cancellable<T, E, F, Fut>(
    config: &RetryConfig,
    label: &str,
    cancel: &dyn CancelCheck,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let total = config.total_attempts();
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            info!("{} cancelled before attempt {}", label, attempt);
            return RetryOutcome::Cancelled;
        }

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}/{}", label, attempt, total);
                }
                return RetryOutcome::Completed(value);
            }
            Err(err) => err,
        };

        if attempt >= total {
            warn!("{} attempt {}/{} failed: {}. Giving up", label, attempt, total, err);
            return RetryOutcome::Exhausted(err);
        }
        if cancel.is_cancelled() {
            info!("{} cancelled before retry", label);
            return RetryOutcome::Cancelled;
        }

        warn!(
            "{} attempt {}/{} failed: {}. Retrying in {:?}",
            label, attempt, total, err, config.delay
        );
        sleep(config.delay).await;
        attempt += 1;
    }
}
