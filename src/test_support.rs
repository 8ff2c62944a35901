//! Scripted browser sessions for exercising the pool, session and
//! orchestrator without Chrome.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::DriverError;
use crate::extractor::{MarkerContext, PageDriver, SessionFactory, StaticPage};

#[derive(Debug, Clone, Copy)]
pub(crate) enum NavigationFault {
    Timeout,
    Failure,
}

/// A [`StaticPage`] with injectable faults
pub(crate) struct ScriptedPage {
    page: StaticPage,
    ready_state: &'static str,
    fault: Option<NavigationFault>,
    alive: bool,
    delay: Option<Duration>,
    hangs_on_close: bool,
    closed: Option<Arc<AtomicUsize>>,
}

impl ScriptedPage {
    pub fn new(html: &str) -> Self {
        Self {
            page: StaticPage::new(html),
            ready_state: "complete",
            fault: None,
            alive: true,
            delay: None,
            hangs_on_close: false,
            closed: None,
        }
    }

    pub fn with_ready_state(mut self, state: &'static str) -> Self {
        self.ready_state = state;
        self
    }

    pub fn failing_navigation(mut self, fault: NavigationFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Fails the liveness probe
    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }

    /// Navigation blocks for `delay`
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `close` never completes
    pub fn hanging_close(mut self) -> Self {
        self.hangs_on_close = true;
        self
    }

    fn count_closes(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.closed = Some(counter);
        self
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fault {
            Some(NavigationFault::Timeout) => {
                self.page.navigate(url).await?;
                Err(DriverError::Timeout("page load", Duration::from_secs(20)))
            }
            Some(NavigationFault::Failure) => {
                Err(DriverError::Protocol("net::ERR_NAME_NOT_RESOLVED".to_string()))
            }
            None => self.page.navigate(url).await,
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        if !self.alive {
            return Err(DriverError::Closed);
        }
        self.page.current_url().await
    }

    async fn ready_state(&self) -> Result<String, DriverError> {
        Ok(self.ready_state.to_string())
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, DriverError> {
        self.page.element_text(selector).await
    }

    async fn element_attr(
        &self,
        selector: &str,
        attr: &str,
    ) -> Result<Option<String>, DriverError> {
        self.page.element_attr(selector, attr).await
    }

    async fn count(&self, selector: &str) -> Result<usize, DriverError> {
        self.page.count(selector).await
    }

    async fn body_text(&self) -> Result<String, DriverError> {
        self.page.body_text().await
    }

    async fn marker_contexts(&self, markers: &[&str]) -> Result<Vec<MarkerContext>, DriverError> {
        self.page.marker_contexts(markers).await
    }

    async fn close(self) -> Result<(), DriverError> {
        if self.hangs_on_close {
            std::future::pending::<()>().await;
        }
        if let Some(counter) = self.closed {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub(crate) enum Plan {
    Page(ScriptedPage),
    LaunchFailure,
}

/// Hands out planned sessions in order, then plain pages over `default_html`
pub(crate) struct ScriptedFactory {
    plans: Mutex<VecDeque<Plan>>,
    default_html: String,
    pub launched: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new(default_html: &str) -> Self {
        Self {
            plans: Mutex::new(VecDeque::new()),
            default_html: default_html.to_string(),
            launched: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn then(self, plan: Plan) -> Self {
        self.plans.lock().unwrap().push_back(plan);
        self
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    type Session = ScriptedPage;

    async fn launch(&self) -> Result<ScriptedPage, DriverError> {
        let plan = self.plans.lock().unwrap().pop_front();
        let page = match plan {
            Some(Plan::Page(page)) => page,
            Some(Plan::LaunchFailure) => {
                return Err(DriverError::Launch("chrome not found".to_string()))
            }
            None => ScriptedPage::new(&self.default_html),
        };
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(page.count_closes(self.closed.clone()))
    }
}

/// A realistic posting with every primary field present
pub(crate) const POSTING_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Senior Backend Engineer | Acme Careers</title>
  <meta property="og:site_name" content="Acme Robotics">
</head>
<body>
  <nav><a href="/">Home</a> <a href="/jobs">Careers</a></nav>
  <h1>Senior Backend Engineer</h1>
  <div class="job-location">Location: Seattle, WA</div>
  <div class="job-type">Employment Type: Full time</div>
  <div class="job-meta"><span>Requisition ID</span> R-20931</div>
  <a class="apply-button">Apply now</a>
</body>
</html>"#;

/// Nothing any strategy accepts
pub(crate) const EMPTY_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Home</title></head>
<body><h1>Apply now</h1><div class="location">Requirements</div></body>
</html>"#;
