//! Background parse worker.
//!
//! Runs one parse at a time on its own task and reports the outcome as a
//! [`ParseEvent`] on a channel, so the caller's event loop never shares state
//! with the task. A second submission while a parse is in flight is
//! rejected, not queued.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::cancel::{CancelCheck, CancelFlag};
use crate::extractor::{ChromeFactory, SessionFactory};
use crate::parser::JobParser;
use crate::types::JobInfo;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("a parse is already in progress")]
    Busy,
}

/// Outcome of a parse that ran to completion
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub url: String,
    /// `None` when every attempt failed
    pub info: Option<JobInfo>,
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

/// Exactly one event is sent per submitted parse
#[derive(Debug, Clone)]
pub enum ParseEvent {
    Finished(ParseReport),
    /// The parse acknowledged a stop request
    Cancelled { url: String, elapsed: Duration },
    /// The parse ignored a stop request for the whole grace period and was
    /// abandoned
    ForceStopped { url: String },
}

struct InFlight {
    url: String,
    cancel: CancelFlag,
    reported: Arc<AtomicBool>,
}

pub struct ParseWorker<F: SessionFactory = ChromeFactory> {
    parser: Arc<JobParser<F>>,
    events: mpsc::UnboundedSender<ParseEvent>,
    current: Mutex<Option<InFlight>>,
}

impl<F: SessionFactory> ParseWorker<F> {
    pub fn new(parser: Arc<JobParser<F>>) -> (Self, mpsc::UnboundedReceiver<ParseEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let worker = Self {
            parser,
            events,
            current: Mutex::new(None),
        };
        (worker, rx)
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.lock_current()
            .as_ref()
            .is_some_and(|flight| !flight.reported.load(Ordering::SeqCst))
    }

    /// Start parsing `url` in the background.
    pub fn submit(&self, url: impl Into<String>) -> Result<(), WorkerError> {
        let mut current = self.lock_current();
        if current
            .as_ref()
            .is_some_and(|flight| !flight.reported.load(Ordering::SeqCst))
        {
            return Err(WorkerError::Busy);
        }

        let url = url.into();
        let cancel = CancelFlag::new();
        let done = CancelFlag::new();
        let reported = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn({
            let parser = self.parser.clone();
            let events = self.events.clone();
            let url = url.clone();
            let cancel = cancel.clone();
            let done = done.clone();
            let reported = reported.clone();
            async move {
                let started = Instant::now();
                let info = parser.parse(&url, None, &cancel).await;
                let elapsed = started.elapsed();

                let event = if info.is_none() && cancel.is_cancelled() {
                    ParseEvent::Cancelled { url, elapsed }
                } else {
                    ParseEvent::Finished(ParseReport {
                        url,
                        info,
                        elapsed,
                        finished_at: Utc::now(),
                    })
                };
                if !reported.swap(true, Ordering::SeqCst) {
                    let _ = events.send(event);
                }
                done.cancel();
            }
        });

        self.spawn_stop_watch(
            url.clone(),
            cancel.clone(),
            done,
            reported.clone(),
            task.abort_handle(),
        );

        info!("Started parsing {}", url);
        *current = Some(InFlight {
            url,
            cancel,
            reported,
        });
        Ok(())
    }

    /// Once a stop is requested, give the parse the grace period to
    /// acknowledge it, then abort the task and report it force-stopped.
    fn spawn_stop_watch(
        &self,
        url: String,
        cancel: CancelFlag,
        done: CancelFlag,
        reported: Arc<AtomicBool>,
        abort: AbortHandle,
    ) {
        let grace = self.parser.config().grace();
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = done.cancelled() => {}
                _ = cancel.cancelled() => {
                    tokio::select! {
                        _ = done.cancelled() => {}
                        _ = sleep(grace) => {
                            if !reported.swap(true, Ordering::SeqCst) {
                                warn!(
                                    "Parse of {} did not stop within {:?}, abandoning it",
                                    url, grace
                                );
                                abort.abort();
                                let _ = events.send(ParseEvent::ForceStopped { url });
                            }
                        }
                    }
                }
            }
        });
    }

    /// Ask the in-flight parse to stop. If it has not reported within the
    /// grace period it is aborted and [`ParseEvent::ForceStopped`] is sent.
    pub fn stop(&self) {
        let current = self.lock_current();
        let Some(flight) = current.as_ref() else {
            return;
        };
        if flight.reported.load(Ordering::SeqCst) {
            return;
        }

        info!("Stopping parse of {}", flight.url);
        flight.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrowserConfig, ParserConfig};
    use crate::test_support::{Plan, ScriptedFactory, ScriptedPage, POSTING_HTML};

    const URL: &str = "https://careers.acme.example/jobs/20931";

    fn worker(
        factory: ScriptedFactory,
    ) -> (
        ParseWorker<ScriptedFactory>,
        mpsc::UnboundedReceiver<ParseEvent>,
    ) {
        let parser = JobParser::new(factory, &BrowserConfig::default(), ParserConfig::default());
        ParseWorker::new(Arc::new(parser))
    }

    fn slow_factory(delay: Duration) -> ScriptedFactory {
        ScriptedFactory::new(POSTING_HTML)
            .then(Plan::Page(ScriptedPage::new(POSTING_HTML).slow(delay)))
    }

    #[tokio::test]
    async fn test_finished_event() {
        let (worker, mut events) = worker(ScriptedFactory::new(POSTING_HTML));
        worker.submit(URL).unwrap();

        match events.recv().await {
            Some(ParseEvent::Finished(report)) => {
                assert_eq!(report.url, URL);
                assert_eq!(report.info.unwrap().title, "Senior Backend Engineer");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(!worker.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submit_is_rejected() {
        let (worker, mut events) = worker(slow_factory(Duration::from_secs(5)));
        worker.submit(URL).unwrap();

        assert!(worker.is_busy());
        assert_eq!(worker.submit(URL), Err(WorkerError::Busy));

        assert!(matches!(events.recv().await, Some(ParseEvent::Finished(_))));
        assert!(worker.submit(URL).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_acknowledged_within_grace() {
        let (worker, mut events) = worker(slow_factory(Duration::from_secs(1)));
        worker.submit(URL).unwrap();
        tokio::task::yield_now().await;
        worker.stop();

        assert!(matches!(
            events.recv().await,
            Some(ParseEvent::Cancelled { .. })
        ));

        sleep(Duration::from_secs(10)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ignored_forces_abandonment() {
        let factory = slow_factory(Duration::from_secs(600));
        let closed = factory.closed.clone();
        let (worker, mut events) = worker(factory);
        worker.submit(URL).unwrap();
        tokio::task::yield_now().await;
        worker.stop();

        assert!(matches!(
            events.recv().await,
            Some(ParseEvent::ForceStopped { .. })
        ));
        assert!(!worker.is_busy());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
