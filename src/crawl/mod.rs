//! Site access: URL scheme, page probing, scanning and item fetching
//!
//! This module provides:
//! - The site HTTP client with configured user agent and timeout
//! - Category page-count discovery ([`Scanner`])
//! - Random page fetching and item extraction ([`Fetcher`])
//! - Reachability checks gating each delivery cycle ([`Connectivity`])

mod connectivity;
mod fetcher;
mod rate_limit;
mod scanner;

pub use connectivity::*;
pub use fetcher::*;
pub use rate_limit::*;
pub use scanner::*;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Result of probing a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Found,
    NotFound,
    /// Transport error or server error; the probe cannot tell whether the page exists
    Failed(String),
}

/// HTTP access to the joke site
#[derive(Debug, Clone)]
pub struct SiteClient {
    client: Client,
    base_url: String,
}

impl SiteClient {
    pub fn new(base_url: &str, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&http.user_agent)
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.timeout_secs))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `{base}/{category}/` for page 1, `{base}/{category}/{page}/` otherwise
    pub fn category_url(&self, category: &str, page: u32) -> String {
        if page <= 1 {
            format!("{}/{}/", self.base_url, category)
        } else {
            format!("{}/{}/{}/", self.base_url, category, page)
        }
    }

    /// `{base}/date/{YYYY-MM-DD}/`
    pub fn date_url(&self, date: NaiveDate) -> String {
        format!("{}/date/{}/", self.base_url, date.format("%Y-%m-%d"))
    }

    /// Check whether a listing page exists
    pub async fn probe(&self, url: &str) -> PageStatus {
        debug!("Probing: {}", url);
        match self.client.get(url).send().await {
            Ok(response) => classify_status(response.status()),
            Err(e) => PageStatus::Failed(e.to_string()),
        }
    }

    /// Fetch a page body; non-success statuses are errors
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("Fetching: {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }
}

/// 404 ends a probe; 5xx is treated as a failed probe; anything else is a page
pub fn classify_status(status: StatusCode) -> PageStatus {
    if status == StatusCode::NOT_FOUND {
        PageStatus::NotFound
    } else if status.is_server_error() {
        PageStatus::Failed(format!("HTTP {}", status))
    } else {
        PageStatus::Found
    }
}
