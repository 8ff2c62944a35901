//! Configuration for the job-posting extractor.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Headless browser and pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome executable; falls back to the platform's usual install path
    #[serde(default)]
    pub chrome_executable: Option<String>,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,
    /// Implicit wait applied to every element lookup
    #[serde(default = "default_element_timeout_secs")]
    pub element_timeout_secs: u64,
    /// Hard cap on concurrently open browsers
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Limit on closing one browser; its pool slot is freed either way
    #[serde(default = "default_close_timeout_secs")]
    pub close_timeout_secs: u64,
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_page_load_timeout_secs() -> u64 {
    20
}

fn default_element_timeout_secs() -> u64 {
    3
}

fn default_pool_size() -> usize {
    2
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    2
}

fn default_close_timeout_secs() -> u64 {
    5
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: default_user_agent(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            element_timeout_secs: default_element_timeout_secs(),
            pool_size: default_pool_size(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            close_timeout_secs: default_close_timeout_secs(),
        }
    }
}

impl BrowserConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }

    /// Configured executable or the usual install location for this platform
    pub fn chrome_path(&self) -> String {
        if let Some(ref path) = self.chrome_executable {
            return path.clone();
        }
        if cfg!(target_os = "macos") {
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".to_string()
        } else if cfg!(target_os = "windows") {
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe".to_string()
        } else {
            "google-chrome".to_string()
        }
    }
}

/// Extraction, retry and timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Additional attempts after the first one fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Bound on readiness and redirect waits
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    /// Candidates tried per field before giving up on selectors
    #[serde(default = "default_max_candidates")]
    pub max_candidates_per_field: usize,
    /// Elapsed time after which a session returns partial results
    #[serde(default = "default_field_budget_secs")]
    pub field_budget_secs: u64,
    /// Watchdog bound on one whole parse call, retries included
    #[serde(default = "default_total_timeout_secs")]
    pub total_timeout_secs: u64,
    /// Time a cancelled worker gets before it is abandoned
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
    /// Also resolve Job Type and Job/Req #
    #[serde(default)]
    pub extended_fields: bool,
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_wait_timeout_secs() -> u64 {
    15
}

fn default_max_candidates() -> usize {
    8
}

fn default_field_budget_secs() -> u64 {
    30
}

fn default_total_timeout_secs() -> u64 {
    45
}

fn default_grace_secs() -> u64 {
    3
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            wait_timeout_secs: default_wait_timeout_secs(),
            max_candidates_per_field: default_max_candidates(),
            field_budget_secs: default_field_budget_secs(),
            total_timeout_secs: default_total_timeout_secs(),
            grace_secs: default_grace_secs(),
            extended_fields: false,
        }
    }
}

impl ParserConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn field_budget(&self) -> Duration {
        Duration::from_secs(self.field_budget_secs)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional `jobtrack` file and the
    /// environment
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("jobtrack").required(false))
            // Override with environment variables (JOBTRACK_BROWSER__POOL_SIZE, etc.)
            .add_source(
                config::Environment::with_prefix("JOBTRACK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
