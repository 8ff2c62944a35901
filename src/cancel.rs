//! Cooperative cancellation checks.

use tokio_util::sync::CancellationToken;

/// Polled at checkpoints between blocking steps of an extraction.
pub trait CancelCheck: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

impl<F> CancelCheck for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Shared cancellation flag that can be raised from any thread and awaited.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(CancellationToken);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Completes once the flag is raised.
    pub async fn cancelled(&self) {
        self.0.cancelled().await
    }
}

impl CancelCheck for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Never cancelled.
pub struct NotCancelled;

impl CancelCheck for NotCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Cancelled when either side is.
pub(crate) struct Either<'a> {
    pub caller: &'a dyn CancelCheck,
    pub watchdog: &'a CancelFlag,
}

impl CancelCheck for Either<'_> {
    fn is_cancelled(&self) -> bool {
        self.watchdog.is_cancelled() || self.caller.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let flag = CancelFlag::new();
        let waiter = tokio::spawn({
            let flag = flag.clone();
            async move { flag.cancelled().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        flag.cancel();
        waiter.await.unwrap();
    }

    #[test]
    fn test_closure_check() {
        let check = || true;
        assert!(check.is_cancelled());
    }

    #[test]
    fn test_either() {
        let watchdog = CancelFlag::new();
        let caller = NotCancelled;
        let either = Either {
            caller: &caller,
            watchdog: &watchdog,
        };
        assert!(!either.is_cancelled());
        watchdog.cancel();
        assert!(either.is_cancelled());
    }
}
