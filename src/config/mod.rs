//! Configuration management for anekdot-relay
//!
//! Configuration is resolved once at startup from three layers, each
//! overriding the previous one: built-in defaults, an optional TOML file,
//! and environment/CLI overrides. The resulting [`Config`] is immutable and
//! handed to each component.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Webhook endpoint deliveries are posted to (required to run the loop)
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Site root, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory holding the ledger and page map files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Hours between category rescans
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: u64,

    /// Seconds between deliveries (clamped, see [`Config::send_interval`])
    #[serde(default = "default_send_interval_secs")]
    pub send_interval_secs: u64,

    /// Closed set of categories to draw from
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Category fetched through the date view instead of by page
    #[serde(default = "default_date_category")]
    pub date_category: Option<String>,

    /// Page count used when a category is missing from the page map
    #[serde(default = "default_fallback_page_count")]
    pub fallback_page_count: u32,

    /// Ledger retention in days
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Days back the date view may reach
    #[serde(default = "default_date_window_days")]
    pub date_window_days: u32,

    /// Scanning configuration
    #[serde(default)]
    pub scan: ScanConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Connectivity gate configuration
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// Backoff for transient failures in the delivery loop
    #[serde(default)]
    pub retry: RetryConfig,

    /// Webhook retry budget
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Category scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Hard cap on pages probed per category
    #[serde(default = "default_max_scan_pages")]
    pub max_pages: u32,

    /// Minimum delay between probes (milliseconds)
    #[serde(default = "default_scan_delay_ms")]
    pub delay_ms: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

/// Connectivity gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Reference endpoints; at least one must answer
    #[serde(default = "default_connectivity_endpoints")]
    pub endpoints: Vec<String>,

    /// Probe timeout in seconds
    #[serde(default = "default_connectivity_timeout")]
    pub timeout_secs: u64,

    /// Wait before the next cycle when offline (seconds)
    #[serde(default = "default_offline_backoff_secs")]
    pub offline_backoff_secs: u64,
}

/// Unbounded backoff used by the loop for fetch and deliver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_base_ms")]
    pub base_ms: u64,

    #[serde(default = "default_retry_max_ms")]
    pub max_ms: u64,
}

/// Bounded retry budget inside the webhook notifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_attempts")]
    pub attempts: u32,

    #[serde(default = "default_notify_base_ms")]
    pub base_ms: u64,

    #[serde(default = "default_notify_max_ms")]
    pub max_ms: u64,
}

/// Values supplied from the environment or the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub webhook_url: Option<String>,
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub check_interval_hours: Option<u64>,
    pub send_interval_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: None,
            base_url: default_base_url(),
            data_dir: default_data_dir(),
            check_interval_hours: default_check_interval_hours(),
            send_interval_secs: default_send_interval_secs(),
            categories: default_categories(),
            date_category: default_date_category(),
            fallback_page_count: default_fallback_page_count(),
            retention_days: default_retention_days(),
            date_window_days: default_date_window_days(),
            scan: ScanConfig::default(),
            http: HttpConfig::default(),
            connectivity: ConnectivityConfig::default(),
            retry: RetryConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_scan_pages(),
            delay_ms: default_scan_delay_ms(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            endpoints: default_connectivity_endpoints(),
            timeout_secs: default_connectivity_timeout(),
            offline_backoff_secs: default_offline_backoff_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_ms: default_retry_base_ms(),
            max_ms: default_retry_max_ms(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            attempts: default_notify_attempts(),
            base_ms: default_notify_base_ms(),
            max_ms: default_notify_max_ms(),
        }
    }
}

impl RetryConfig {
    /// Unbounded policy: retries until the operation succeeds or fails permanently
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::unbounded(
            Duration::from_millis(self.base_ms),
            Duration::from_millis(self.max_ms),
        )
    }
}

impl NotifyConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::bounded(
            self.attempts,
            Duration::from_millis(self.base_ms),
            Duration::from_millis(self.max_ms),
        )
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from a file when given, otherwise start from defaults
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load(path),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply environment/CLI overrides on top of the loaded values
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.webhook_url {
            self.webhook_url = Some(url);
        }
        if let Some(base) = overrides.base_url {
            self.base_url = base;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(hours) = overrides.check_interval_hours {
            self.check_interval_hours = hours;
        }
        if let Some(secs) = overrides.send_interval_secs {
            self.send_interval_secs = secs;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("base_url is not a valid URL: {}", e)))?;

        if self.categories.is_empty() {
            return Err(Error::Config("categories must not be empty".to_string()));
        }

        if let Some(date_category) = &self.date_category {
            if !self.categories.contains(date_category) {
                return Err(Error::Config(format!(
                    "date_category '{}' is not in categories",
                    date_category
                )));
            }
        }

        if self.scan.max_pages == 0 {
            return Err(Error::Config(
                "scan.max_pages must be positive".to_string(),
            ));
        }

        if self.retention_days == 0 {
            return Err(Error::Config(
                "retention_days must be positive".to_string(),
            ));
        }

        if !(1..=MAX_CHECK_INTERVAL_HOURS).contains(&self.check_interval_hours) {
            return Err(Error::Config(format!(
                "check_interval_hours must be between 1 and {}",
                MAX_CHECK_INTERVAL_HOURS
            )));
        }

        if self.notify.attempts == 0 {
            return Err(Error::Config(
                "notify.attempts must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// The webhook endpoint; required before the delivery loop may start
    pub fn webhook_url(&self) -> Result<Url> {
        let raw = self
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("WEBHOOK_URL is not set".to_string()))?;

        Url::parse(raw).map_err(|e| Error::Config(format!("WEBHOOK_URL is invalid: {}", e)))
    }

    /// Delivery interval clamped to the supported range
    pub fn send_interval(&self) -> Duration {
        Duration::from_secs(clamp_send_interval(self.send_interval_secs))
    }

    /// Time between page map rescans, capped at one year
    pub fn refresh_interval(&self) -> chrono::Duration {
        let hours = self.check_interval_hours.min(MAX_CHECK_INTERVAL_HOURS);
        chrono::Duration::hours(hours as i64)
    }

    /// Wait used when the connectivity check fails
    pub fn offline_backoff(&self) -> Duration {
        Duration::from_secs(self.connectivity.offline_backoff_secs)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(SENT_FILE)
    }

    pub fn page_map_path(&self) -> PathBuf {
        self.data_dir.join(PAGE_MAP_FILE)
    }
}

/// Clamp a delivery interval to `[60, 86400]` seconds
pub fn clamp_send_interval(secs: u64) -> u64 {
    secs.clamp(MIN_SEND_INTERVAL_SECS, MAX_SEND_INTERVAL_SECS)
}
