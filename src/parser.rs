//! Retry/cancel orchestrator: the entry point callers use to parse a posting.
//!
//! Each call runs extraction attempts one after another under a watchdog.
//! When the total timeout expires the watchdog raises cancellation; if the
//! attempt in flight has not returned after a further grace period it is
//! dropped, and the browser it held is closed rather than pooled.

use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::cancel::{CancelCheck, CancelFlag, Either};
use crate::config::{AppConfig, BrowserConfig, ParserConfig};
use crate::error::ExtractError;
use crate::extractor::{BrowserPool, ChromeFactory, ExtractionSession, SessionFactory};
use crate::retry::{retry_cancellable, RetryConfig, RetryOutcome};
use crate::types::JobInfo;

pub struct JobParser<F: SessionFactory = ChromeFactory> {
    pool: Arc<BrowserPool<F>>,
    config: ParserConfig,
}

impl JobParser<ChromeFactory> {
    /// Parser backed by a pool of headless Chrome sessions
    pub fn chrome(config: &AppConfig) -> Self {
        Self::new(
            ChromeFactory::new(config.browser.clone()),
            &config.browser,
            config.parser.clone(),
        )
    }
}

impl<F: SessionFactory> JobParser<F> {
    pub fn new(factory: F, browser: &BrowserConfig, config: ParserConfig) -> Self {
        Self::with_pool(Arc::new(BrowserPool::new(factory, browser)), config)
    }

    pub fn with_pool(pool: Arc<BrowserPool<F>>, config: ParserConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &Arc<BrowserPool<F>> {
        &self.pool
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse the posting at `url`.
    ///
    /// Returns `None` when cancelled, when every attempt failed, or when the
    /// watchdog had to abandon the work. Failure details go to the log only.
    /// `max_retries` overrides the configured number of extra attempts.
    pub async fn parse(
        &self,
        url: &str,
        max_retries: Option<u32>,
        cancelled: &dyn CancelCheck,
    ) -> Option<JobInfo> {
        if cancelled.is_cancelled() {
            info!("Parsing cancelled by user");
            return None;
        }

        let watchdog = CancelFlag::new();
        let cancel = Either {
            caller: cancelled,
            watchdog: &watchdog,
        };
        let retries = max_retries.unwrap_or(self.config.max_retries);
        let total = self.config.total_timeout();
        let grace = self.config.grace();

        let work = self.run_attempts(url, retries, &cancel);
        tokio::pin!(work);

        tokio::select! {
            result = &mut work => result,
            _ = sleep(total) => {
                warn!("Parsing exceeded {:?}, cancelling", total);
                watchdog.cancel();
                match timeout(grace, &mut work).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "Parsing did not stop within {:?}, abandoning its browser",
                            grace
                        );
                        None
                    }
                }
            }
        }
    }

    /// Close every idle browser. Further parses fail.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }

    async fn run_attempts(
        &self,
        url: &str,
        max_retries: u32,
        cancel: &dyn CancelCheck,
    ) -> Option<JobInfo> {
        let retry = RetryConfig::fixed(max_retries, self.config.retry_delay());
        match retry_cancellable(&retry, "Job parsing", cancel, || self.attempt(url, cancel)).await {
            RetryOutcome::Completed(Some(job)) => Some(job),
            RetryOutcome::Completed(None) | RetryOutcome::Cancelled => {
                info!("Parsing cancelled");
                None
            }
            RetryOutcome::Exhausted(e) => {
                if e.is_resource() {
                    error!("All parsing attempts failed: {}", e);
                } else {
                    warn!("All parsing attempts failed: {}", e);
                }
                None
            }
        }
    }

    /// One attempt on a pooled browser. A browser whose attempt failed is
    /// discarded instead of returned.
    async fn attempt(
        &self,
        url: &str,
        cancel: &dyn CancelCheck,
    ) -> Result<Option<JobInfo>, ExtractError> {
        let mut lease = self.pool.acquire().await?;
        let result = match lease.driver_mut() {
            Ok(driver) => {
                ExtractionSession::new(driver, &self.config, cancel)
                    .run(url)
                    .await
            }
            Err(e) => Err(e.into()),
        };

        if result.is_ok() {
            self.pool.release(lease).await;
        } else {
            self.pool.discard(lease).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::NotCancelled;
    use crate::test_support::{
        NavigationFault, Plan, ScriptedFactory, ScriptedPage, EMPTY_HTML, POSTING_HTML,
    };
    use crate::types::UNKNOWN;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::Instant;

    const URL: &str = "https://careers.acme.example/jobs/20931";

    fn parser(factory: ScriptedFactory) -> JobParser<ScriptedFactory> {
        let config = ParserConfig {
            retry_delay_ms: 10,
            ..Default::default()
        };
        JobParser::new(factory, &BrowserConfig::default(), config)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_parse_posting() {
        let parser = parser(ScriptedFactory::new(POSTING_HTML));
        let job = parser.parse(URL, None, &NotCancelled).await.unwrap();

        assert_eq!(job.title, "Senior Backend Engineer");
        assert_eq!(job.company, "Acme Robotics");
        assert_eq!(job.location, "Seattle, WA");

        let stats = parser.pool().stats();
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.checked_out, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt_skips_pool() {
        let factory = ScriptedFactory::new(POSTING_HTML);
        let launched = factory.launched.clone();
        let parser = parser(factory);
        let flag = CancelFlag::new();
        flag.cancel();

        assert_eq!(parser.parse(URL, None, &flag).await, None);
        assert_eq!(launched.load(Ordering::SeqCst), 0);
        assert_eq!(parser.pool().stats().launched, 0);
    }

    #[tokio::test]
    async fn test_all_unknown_is_still_a_result() {
        let parser = parser(ScriptedFactory::new(EMPTY_HTML));
        let job = parser.parse(URL, None, &NotCancelled).await.unwrap();

        assert_eq!(job.title, UNKNOWN);
        assert_eq!(job.company, UNKNOWN);
        assert_eq!(job.location, UNKNOWN);
    }

    #[tokio::test]
    async fn test_second_attempt_result_returned_without_leak() {
        let factory = ScriptedFactory::new(POSTING_HTML).then(Plan::Page(
            ScriptedPage::new(EMPTY_HTML).failing_navigation(NavigationFault::Failure),
        ));
        let closed = factory.closed.clone();
        let parser = parser(factory);

        let job = parser.parse(URL, Some(1), &NotCancelled).await.unwrap();
        assert_eq!(job.title, "Senior Backend Engineer");

        let stats = parser.pool().stats();
        assert_eq!(stats.launched, 2);
        assert_eq!(stats.checked_out, 0);
        assert_eq!(stats.idle, 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_none() {
        let factory = ScriptedFactory::new(POSTING_HTML)
            .then(Plan::LaunchFailure)
            .then(Plan::LaunchFailure);
        let parser = parser(factory);

        assert_eq!(parser.parse(URL, Some(1), &NotCancelled).await, None);
        assert_eq!(parser.pool().stats().launched, 0);
        assert_eq!(parser.pool().stats().checked_out, 0);
    }

    #[tokio::test]
    async fn test_zero_retries_means_one_attempt() {
        let factory = ScriptedFactory::new(POSTING_HTML).then(Plan::LaunchFailure);
        let parser = parser(factory);

        assert_eq!(parser.parse(URL, Some(0), &NotCancelled).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_abandons_hung_attempt() {
        let factory = ScriptedFactory::new(POSTING_HTML)
            .then(Plan::Page(ScriptedPage::new(POSTING_HTML).slow(Duration::from_secs(600))));
        let closed = factory.closed.clone();
        let parser = parser(factory);

        let started = Instant::now();
        assert_eq!(parser.parse(URL, None, &NotCancelled).await, None);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(48) && elapsed < Duration::from_secs(49));

        settle().await;
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        let stats = parser.pool().stats();
        assert_eq!(stats.checked_out, 0);
        assert_eq!(stats.idle, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_cancellation_honored_within_grace() {
        let factory = ScriptedFactory::new(POSTING_HTML)
            .then(Plan::Page(ScriptedPage::new(POSTING_HTML).slow(Duration::from_secs(46))));
        let closed = factory.closed.clone();
        let parser = parser(factory);

        assert_eq!(parser.parse(URL, None, &NotCancelled).await, None);

        assert_eq!(closed.load(Ordering::SeqCst), 0);
        assert_eq!(parser.pool().stats().idle, 1);
    }

    #[tokio::test]
    async fn test_parse_after_shutdown_fails() {
        let parser = parser(ScriptedFactory::new(POSTING_HTML));
        parser.shutdown().await;
        assert_eq!(parser.parse(URL, Some(0), &NotCancelled).await, None);
    }
}
