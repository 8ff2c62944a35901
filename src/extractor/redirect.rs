//! LinkedIn search-result pages show the selected job in a side panel. The
//! detail page for that job is resolved from the `currentJobId` query
//! parameter and loaded in its place.

use std::time::Duration;
use tracing::info;
use url::Url;

use super::driver::{wait_for_element, PageDriver};
use crate::error::DriverError;

const RESULTS_PANEL: &str = "[class*='jobs-search__job-details']";
const DETAIL_TOP_CARD: &str = "[class*='jobs-unified-top-card']";

pub fn is_search_results(url: &str) -> bool {
    url.contains("linkedin.com/jobs/search")
}

/// Value of the `currentJobId` query parameter, if it looks like an id
pub fn current_job_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "currentJobId")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Locators for the link to the job's detail page, most specific first
fn card_link_selectors(job_id: &str) -> [String; 4] {
    [
        format!("[data-job-id*='{job_id}']"),
        format!("[data-job-id*='{job_id}'] a"),
        format!("{RESULTS_PANEL} a[href*='{job_id}']"),
        format!("{RESULTS_PANEL} a[href*='/jobs/view/']"),
    ]
}

/// Follow the selected result card to its detail page.
///
/// Returns the detail URL once it has rendered, or `None` when the page
/// offers nothing to follow.
pub async fn resolve_detail_page(
    driver: &mut dyn PageDriver,
    url: &str,
    wait: Duration,
) -> Result<Option<String>, DriverError> {
    wait_for_element(driver, RESULTS_PANEL, wait).await?;

    let Some(job_id) = current_job_id(url) else {
        info!("No currentJobId in search URL");
        return Ok(None);
    };

    let mut href = None;
    for selector in card_link_selectors(&job_id) {
        if let Ok(Some(link)) = driver.element_attr(&selector, "href").await {
            if !link.trim().is_empty() {
                href = Some(link);
                break;
            }
        }
    }
    let Some(href) = href else {
        info!("Could not find job posting URL");
        return Ok(None);
    };

    let base = driver.current_url().await?;
    let target = Url::parse(&base)
        .and_then(|base| base.join(&href))
        .map(|joined| joined.to_string())
        .unwrap_or(href);
    info!("Found job posting URL: {}", target);

    match driver.navigate(&target).await {
        Err(e) if !e.is_timeout() => return Err(e),
        _ => {}
    }
    wait_for_element(driver, DETAIL_TOP_CARD, wait).await?;
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::StaticPage;

    const SEARCH_URL: &str =
        "https://www.linkedin.com/jobs/search/?currentJobId=3912345678&keywords=rust";
    const DETAIL_URL: &str = "https://www.linkedin.com/jobs/view/3912345678/";

    const SEARCH_HTML: &str = r#"<html><body>
      <ul><li data-job-id="3912345678"><a href="/jobs/view/3912345678/">Rust Engineer</a></li></ul>
      <div class="jobs-search__job-details--container">panel</div>
    </body></html>"#;

    const DETAIL_HTML: &str = r#"<html><body>
      <div class="jobs-unified-top-card__content">
        <h1 class="jobs-unified-top-card__job-title">Rust Engineer</h1>
      </div>
    </body></html>"#;

    #[test]
    fn test_is_search_results() {
        assert!(is_search_results(SEARCH_URL));
        assert!(!is_search_results(DETAIL_URL));
        assert!(!is_search_results("https://boards.greenhouse.io/acme/jobs/1"));
    }

    #[test]
    fn test_current_job_id() {
        assert_eq!(current_job_id(SEARCH_URL).as_deref(), Some("3912345678"));
        assert_eq!(current_job_id("https://www.linkedin.com/jobs/search/?keywords=x"), None);
        assert_eq!(
            current_job_id("https://www.linkedin.com/jobs/search/?currentJobId=1'%5D"),
            None
        );
    }

    #[tokio::test]
    async fn test_resolves_relative_card_link() {
        let mut page = StaticPage::new(SEARCH_HTML).with_page(DETAIL_URL, DETAIL_HTML);
        page.navigate(SEARCH_URL).await.unwrap();

        let resolved = resolve_detail_page(&mut page, SEARCH_URL, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(resolved.as_deref(), Some(DETAIL_URL));
        assert_eq!(page.current_url().await.unwrap(), DETAIL_URL);
    }

    #[tokio::test]
    async fn test_missing_job_id_stays_put() {
        let url = "https://www.linkedin.com/jobs/search/?keywords=rust";
        let mut page = StaticPage::new(SEARCH_HTML);
        page.navigate(url).await.unwrap();

        let resolved = resolve_detail_page(&mut page, url, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(resolved, None);
        assert_eq!(page.current_url().await.unwrap(), url);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrendered_results_time_out() {
        let mut page = StaticPage::new("<html><body><p>loading</p></body></html>");
        page.navigate(SEARCH_URL).await.unwrap();

        let err = resolve_detail_page(&mut page, SEARCH_URL, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
