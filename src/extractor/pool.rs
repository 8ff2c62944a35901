//! Pool of reusable browser sessions.
//!
//! The pool hard-caps the number of open sessions at its configured size.
//! Every session outside the idle set, checked out or still closing, holds
//! one semaphore permit, and a new session is launched only when the idle set
//! is empty. `acquire` beyond the cap waits for a permit and gives up with
//! [`ExtractError::PoolExhausted`] after the acquire timeout. No overflow
//! session is ever constructed. Closing a session is bounded by the close
//! timeout, after which its permit is returned regardless.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::driver::{PageDriver, SessionFactory};
use crate::config::BrowserConfig;
use crate::error::{DriverError, ExtractError};

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: usize,
    /// Sessions holding a permit outside the idle set, including ones being closed
    pub checked_out: usize,
    /// Sessions constructed over the pool's lifetime
    pub launched: usize,
}

pub struct BrowserPool<F: SessionFactory> {
    factory: F,
    idle: Mutex<Vec<F::Session>>,
    permits: Arc<Semaphore>,
    size: usize,
    acquire_timeout: Duration,
    probe_timeout: Duration,
    close_timeout: Duration,
    closed: AtomicBool,
    launched: AtomicUsize,
}

impl<F: SessionFactory> BrowserPool<F> {
    pub fn new(factory: F, config: &BrowserConfig) -> Self {
        let size = config.pool_size.max(1);
        Self {
            factory,
            idle: Mutex::new(Vec::with_capacity(size)),
            permits: Arc::new(Semaphore::new(size)),
            size,
            acquire_timeout: config.acquire_timeout(),
            probe_timeout: config.probe_timeout(),
            close_timeout: config.close_timeout(),
            closed: AtomicBool::new(false),
            launched: AtomicUsize::new(0),
        }
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<F::Session>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check out an idle session, or launch one if none is idle.
    pub async fn acquire(&self) -> Result<PooledSession<F::Session>, ExtractError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ExtractError::PoolClosed);
        }

        let permit = match timeout(self.acquire_timeout, self.permits.clone().acquire_owned()).await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(ExtractError::PoolClosed),
            Err(_) => {
                warn!(
                    "No browser available after {:?} ({} in use)",
                    self.acquire_timeout, self.size
                );
                return Err(ExtractError::PoolExhausted(self.acquire_timeout));
            }
        };

        let reused = self.lock_idle().pop();
        if let Some(session) = reused {
            info!("Reusing browser from pool");
            return Ok(PooledSession::new(session, permit, self.close_timeout));
        }

        info!("Creating new browser instance");
        let session = self.factory.launch().await.map_err(|e| {
            warn!("Failed to create browser: {}", e);
            ExtractError::Resource(e)
        })?;
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(PooledSession::new(session, permit, self.close_timeout))
    }

    /// Return a session after use. It goes back to the idle set only if it
    /// answers the liveness probe and the pool is open with spare capacity.
    pub async fn release(&self, mut lease: PooledSession<F::Session>) {
        let Some((session, permit)) = lease.take() else {
            return;
        };

        let live = matches!(
            timeout(self.probe_timeout, session.current_url()).await,
            Ok(Ok(_))
        );

        let rejected = if live {
            let mut idle = self.lock_idle();
            if self.closed.load(Ordering::SeqCst) {
                debug!("Pool is shut down, closing browser");
                Some(session)
            } else if idle.len() < self.size {
                idle.push(session);
                debug!("Browser returned to pool");
                None
            } else {
                info!("Browser pool full, closing browser");
                Some(session)
            }
        } else {
            warn!("Browser failed liveness probe, closing it");
            Some(session)
        };

        if let Some(session) = rejected {
            close_quietly(session, self.close_timeout).await;
        }
        drop(permit);
    }

    /// Terminate a session that failed during use, without probing it.
    pub async fn discard(&self, mut lease: PooledSession<F::Session>) {
        if let Some((session, permit)) = lease.take() {
            debug!("Discarding browser after failure");
            close_quietly(session, self.close_timeout).await;
            drop(permit);
        }
    }

    /// Close every idle session and refuse further acquires. Idempotent.
    pub async fn shutdown(&self) {
        let drained = {
            let mut idle = self.lock_idle();
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *idle)
        };
        self.permits.close();

        let count = drained.len();
        for session in drained {
            close_quietly(session, self.close_timeout).await;
        }
        info!("Browser pool shut down, closed {} idle browser(s)", count);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.lock_idle().len(),
            checked_out: self.size.saturating_sub(self.permits.available_permits()),
            launched: self.launched.load(Ordering::SeqCst),
        }
    }
}

async fn close_quietly<S: PageDriver>(session: S, limit: Duration) {
    match timeout(limit, session.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Error closing browser: {}", e),
        Err(_) => warn!("Browser did not close within {:?}, giving up on it", limit),
    }
}

/// Exclusive lease on one pooled session.
///
/// Hand it back with [`BrowserPool::release`] or [`BrowserPool::discard`].
/// A lease dropped any other way is treated as poisoned: its session is
/// closed in the background and its slot stays occupied until the close
/// finishes.
pub struct PooledSession<S: PageDriver + 'static> {
    session: Option<S>,
    permit: Option<OwnedSemaphorePermit>,
    close_timeout: Duration,
}

impl<S: PageDriver + 'static> PooledSession<S> {
    fn new(session: S, permit: OwnedSemaphorePermit, close_timeout: Duration) -> Self {
        Self {
            session: Some(session),
            permit: Some(permit),
            close_timeout,
        }
    }

    pub fn driver_mut(&mut self) -> Result<&mut S, DriverError> {
        self.session.as_mut().ok_or(DriverError::Closed)
    }

    fn take(&mut self) -> Option<(S, Option<OwnedSemaphorePermit>)> {
        let session = self.session.take()?;
        Some((session, self.permit.take()))
    }
}

impl<S: PageDriver + 'static> Drop for PooledSession<S> {
    fn drop(&mut self) {
        let Some((session, permit)) = self.take() else {
            return;
        };
        warn!("Browser session abandoned, closing it");
        let limit = self.close_timeout;
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    close_quietly(session, limit).await;
                    drop(permit);
                });
            }
            Err(_) => debug!("No runtime available to close abandoned browser"),
        }
    }
}
