//! Headless Chrome sessions using chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use super::driver::{MarkerContext, PageDriver, SessionFactory};
use crate::config::BrowserConfig;
use crate::error::DriverError;

const ELEMENT_POLL: Duration = Duration::from_millis(200);

const MARKER_SCRIPT: &str = r#"(() => {
  const markers = __MARKERS__;
  const hidden = ['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE'];
  const norm = (s) => (s || '').split(/\s+/).filter(Boolean).join(' ');
  const out = [];
  if (!document.body) return out;
  for (const el of document.body.querySelectorAll('*')) {
    if (hidden.includes(el.tagName)) continue;
    let own = '';
    for (const node of el.childNodes) {
      if (node.nodeType === Node.TEXT_NODE) own += node.textContent;
    }
    own = own.toLowerCase();
    if (!markers.some((m) => own.includes(m))) continue;
    out.push({
      label: norm(el.innerText),
      context: norm(el.parentElement ? el.parentElement.innerText : ''),
    });
    if (out.length >= 20) break;
  }
  return out;
})()"#;

fn protocol(e: CdpError) -> DriverError {
    match e {
        CdpError::Timeout => DriverError::Timeout("browser request", Duration::ZERO),
        other => DriverError::Protocol(other.to_string()),
    }
}

/// One Chrome process with a single tab
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handle: JoinHandle<()>,
    page_load_timeout: Duration,
    element_timeout: Duration,
    /// Budget for a graceful shutdown before the process is killed
    graceful_close: Duration,
}

impl ChromeSession {
    /// Launch a headless browser with a fixed viewport and animations suppressed
    pub async fn launch(config: &BrowserConfig) -> Result<Self, DriverError> {
        let mut builder = ChromeConfig::builder()
            .chrome_executable(config.chrome_path())
            .no_sandbox()
            .disable_default_args()
            .request_timeout(config.page_load_timeout())
            .window_size(config.window_width, config.window_height);

        builder = if config.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        let chrome_config = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-plugins")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-renderer-backgrounding")
            .arg("--disable-backgrounding-occluded-windows")
            .arg("--force-prefers-reduced-motion")
            .arg("--disable-smooth-scrolling")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", config.user_agent))
            .build()
            .map_err(|e| DriverError::Launch(format!("invalid browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        // The handler must keep running for the browser to respond
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Some(Err(kill_err)) = browser.kill().await {
                    debug!("Failed to kill browser: {}", kill_err);
                }
                handle.abort();
                return Err(DriverError::Launch(format!("failed to open tab: {e}")));
            }
        };

        Ok(Self {
            browser,
            page,
            handle,
            page_load_timeout: config.page_load_timeout(),
            element_timeout: config.element_timeout(),
            graceful_close: config.close_timeout() / 2,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, DriverError> {
        self.page
            .evaluate(script)
            .await
            .map_err(protocol)?
            .into_value::<T>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    /// First element matching `selector`, polling up to the implicit wait
    async fn find(&self, selector: &str) -> Option<Element> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Some(element);
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(ELEMENT_POLL).await;
        }
    }
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!("Navigating to {}", url);
        match timeout(self.page_load_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(CdpError::Timeout)) | Err(_) => {
                Err(DriverError::Timeout("page load", self.page_load_timeout))
            }
            Ok(Err(e)) => Err(protocol(e)),
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.page.url().await.map_err(protocol)?.unwrap_or_default())
    }

    async fn ready_state(&self) -> Result<String, DriverError> {
        self.eval("document.readyState").await
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, DriverError> {
        match self.find(selector).await {
            Some(element) => element.inner_text().await.map_err(protocol),
            None => Ok(None),
        }
    }

    async fn element_attr(
        &self,
        selector: &str,
        attr: &str,
    ) -> Result<Option<String>, DriverError> {
        match self.find(selector).await {
            Some(element) => element.attribute(attr).await.map_err(protocol),
            None => Ok(None),
        }
    }

    async fn count(&self, selector: &str) -> Result<usize, DriverError> {
        // Chrome reports a selector with no matches as an error
        Ok(self
            .page
            .find_elements(selector)
            .await
            .map(|elements| elements.len())
            .unwrap_or(0))
    }

    async fn body_text(&self) -> Result<String, DriverError> {
        self.eval("document.body ? document.body.innerText : ''").await
    }

    async fn marker_contexts(&self, markers: &[&str]) -> Result<Vec<MarkerContext>, DriverError> {
        let encoded =
            serde_json::to_string(markers).map_err(|e| DriverError::Script(e.to_string()))?;
        self.eval(&MARKER_SCRIPT.replace("__MARKERS__", &encoded))
            .await
    }

    async fn close(mut self) -> Result<(), DriverError> {
        let limit = self.graceful_close;
        let browser = &mut self.browser;
        let graceful = timeout(limit, async move {
            browser.close().await.map_err(protocol)?;
            browser
                .wait()
                .await
                .map_err(|e| DriverError::Protocol(e.to_string()))?;
            Ok::<_, DriverError>(())
        })
        .await
        .unwrap_or_else(|_| Err(DriverError::Timeout("browser close", limit)));

        if let Err(ref e) = graceful {
            debug!("Browser did not shut down cleanly ({}), killing it", e);
            if let Some(Err(kill_err)) = self.browser.kill().await {
                debug!("Failed to kill browser: {}", kill_err);
            }
        }
        self.handle.abort();
        graceful
    }
}

/// Launches [`ChromeSession`]s for the pool
pub struct ChromeFactory {
    config: BrowserConfig,
}

impl ChromeFactory {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeFactory {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession, DriverError> {
        ChromeSession::launch(&self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_script_embeds_markers() {
        let encoded = serde_json::to_string(&["job id", "requisition id"]).unwrap();
        let script = MARKER_SCRIPT.replace("__MARKERS__", &encoded);
        assert!(script.contains(r#"const markers = ["job id","requisition id"];"#));
        assert!(!script.contains("__MARKERS__"));
    }

    #[test]
    fn test_cdp_timeout_maps_to_timeout() {
        assert!(protocol(CdpError::Timeout).is_timeout());
    }
}
