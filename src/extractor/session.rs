//! One extraction attempt against a live page.
//!
//! Navigate, optionally follow a search-result redirect, wait for the
//! document to settle, then resolve each field in priority order. Between
//! fields the session checks for cancellation (returning `None`) and for an
//! exhausted time budget (returning what it has so far).

use tokio::time::Instant;
use tracing::{info, warn};

use super::driver::{wait_for_ready, PageDriver};
use super::redirect;
use super::strategies::strategies;
use crate::cancel::CancelCheck;
use crate::config::ParserConfig;
use crate::error::ExtractError;
use crate::types::JobInfo;

pub struct ExtractionSession<'a> {
    driver: &'a mut dyn PageDriver,
    config: &'a ParserConfig,
    cancel: &'a dyn CancelCheck,
}

impl<'a> ExtractionSession<'a> {
    pub fn new(
        driver: &'a mut dyn PageDriver,
        config: &'a ParserConfig,
        cancel: &'a dyn CancelCheck,
    ) -> Self {
        Self {
            driver,
            config,
            cancel,
        }
    }

    /// Run the session against `url`.
    ///
    /// `Ok(None)` means cancellation was observed. Navigation failures other
    /// than a page-load timeout are errors; everything after navigation
    /// degrades to "Unknown" fields instead of failing.
    pub async fn run(&mut self, url: &str) -> Result<Option<JobInfo>, ExtractError> {
        let started = Instant::now();
        let wait = self.config.wait_timeout();
        info!("Navigating to URL: {}", url);

        match self.driver.navigate(url).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => warn!("Page load timed out, continuing with partial page"),
            Err(source) => {
                return Err(ExtractError::Navigation {
                    url: url.to_string(),
                    source,
                })
            }
        }

        if self.cancel.is_cancelled() {
            info!("Parsing cancelled after page navigation");
            return Ok(None);
        }

        if redirect::is_search_results(url) {
            info!("Detected LinkedIn job search page, resolving job posting");
            if let Err(e) = redirect::resolve_detail_page(&mut *self.driver, url, wait).await {
                warn!("Error extracting job posting URL: {}", e);
            }
        }

        if wait_for_ready(&*self.driver, wait).await.is_err() {
            info!("Page load check timed out after {:?}, continuing anyway", wait);
        }

        let extended = self.config.extended_fields;
        let mut job = JobInfo::unknown(extended);
        for strategy in strategies(extended) {
            if let Some(value) = strategy
                .resolve(&*self.driver, self.config.max_candidates_per_field)
                .await
            {
                job.set(strategy.field, value);
            }

            if self.cancel.is_cancelled() {
                info!("Parsing cancelled after {} extraction", strategy.field);
                return Ok(None);
            }

            let elapsed = started.elapsed();
            if elapsed > self.config.field_budget() {
                warn!(
                    "Parsing budget exceeded after {:.1}s, returning partial results",
                    elapsed.as_secs_f64()
                );
                return Ok(Some(job));
            }
        }

        info!(
            "Successfully parsed job info in {:.1}s: {:?}",
            started.elapsed().as_secs_f64(),
            job
        );
        Ok(Some(job))
    }
}
