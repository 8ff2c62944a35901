//! Browser handle abstraction used by the extraction session.
//!
//! Locators are CSS selectors so the same catalog runs against a live Chrome
//! page and against a captured HTML snapshot.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::DriverError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// An element whose own text contains a label marker, with the text of its
/// parent element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkerContext {
    pub label: String,
    pub context: String,
}

/// One live page in an exclusively borrowed browser.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url`. A page-load timeout is reported as [`DriverError::Timeout`].
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// Value of `document.readyState`.
    async fn ready_state(&self) -> Result<String, DriverError>;

    /// Rendered text of the first element matching `selector`.
    async fn element_text(&self, selector: &str) -> Result<Option<String>, DriverError>;

    /// Attribute of the first element matching `selector`.
    async fn element_attr(&self, selector: &str, attr: &str)
        -> Result<Option<String>, DriverError>;

    async fn count(&self, selector: &str) -> Result<usize, DriverError>;

    /// Visible text of the document body.
    async fn body_text(&self) -> Result<String, DriverError>;

    /// Elements whose own text contains any of `markers` (lowercase).
    async fn marker_contexts(&self, markers: &[&str]) -> Result<Vec<MarkerContext>, DriverError>;

    /// Terminate the underlying browser.
    async fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// Builds new browser sessions for the pool.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: PageDriver + 'static;

    async fn launch(&self) -> Result<Self::Session, DriverError>;
}

/// Poll until at least one element matches `selector`.
pub async fn wait_for_element(
    driver: &dyn PageDriver,
    selector: &str,
    timeout: Duration,
) -> Result<(), DriverError> {
    let deadline = Instant::now() + timeout;
    loop {
        if driver.count(selector).await.unwrap_or(0) > 0 {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(DriverError::Timeout("element wait", timeout));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Poll until the document reports `complete`.
pub async fn wait_for_ready(driver: &dyn PageDriver, timeout: Duration) -> Result<(), DriverError> {
    let deadline = Instant::now() + timeout;
    loop {
        if matches!(driver.ready_state().await.as_deref(), Ok("complete")) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(DriverError::Timeout("ready state", timeout));
        }
        sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedPage;

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_ready_times_out() {
        let page = ScriptedPage::new("<html><body></body></html>").with_ready_state("loading");
        let err = wait_for_ready(&page, Duration::from_secs(2)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_wait_for_ready_complete() {
        let page = ScriptedPage::new("<html><body></body></html>");
        assert!(wait_for_ready(&page, Duration::from_secs(2)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_element() {
        let page = ScriptedPage::new(r#"<html><body><div class="card"></div></body></html>"#);
        assert!(wait_for_element(&page, ".card", Duration::from_secs(1)).await.is_ok());
        assert!(wait_for_element(&page, ".missing", Duration::from_secs(1))
            .await
            .is_err());
    }
}
