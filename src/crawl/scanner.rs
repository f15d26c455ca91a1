//! Category page-count discovery

use super::{PageStatus, ProbeThrottle, SiteClient};
use crate::config::Config;
use crate::store::{PageMap, PageMapStore};
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

/// Probes each category page by page until the site answers 404.
///
/// This is the most expensive operation in the system: one request per
/// existing page across every category, spaced by the probe throttle.
pub struct Scanner {
    client: SiteClient,
    store: PageMapStore,
    throttle: ProbeThrottle,
    max_pages: u32,
    refresh_interval: chrono::Duration,
}

impl Scanner {
    pub fn new(client: SiteClient, store: PageMapStore, config: &Config) -> Self {
        Self {
            client,
            store,
            throttle: ProbeThrottle::new(Duration::from_millis(config.scan.delay_ms)),
            max_pages: config.scan.max_pages,
            refresh_interval: config.refresh_interval(),
        }
    }

    /// Rebuild the page map for `categories`, persist it and return it
    pub async fn scan(&self, categories: &[String]) -> PageMap {
        info!("Scanning {} categories...", categories.len());

        let mut counts = BTreeMap::new();
        for category in categories {
            let pages = self.scan_category(category).await;
            info!(category = %category, pages, "Category scanned");
            counts.insert(category.clone(), pages);
        }

        let map = PageMap::new(Utc::now(), self.refresh_interval, counts);
        info!(
            total_pages = map.total_pages(),
            next_scan = %map.next_scan,
            "Category map updated"
        );
        self.store.save(&map);
        map
    }

    /// Count the pages of one category.
    ///
    /// A 404 at page N yields N-1 (0 when page 1 is missing). Transport and
    /// server errors stop the probe the same way. Counting stops at the
    /// configured cap.
    pub async fn scan_category(&self, category: &str) -> u32 {
        for page in 1..=self.max_pages {
            self.throttle.wait().await;
            let url = self.client.category_url(category, page);

            match self.client.probe(&url).await {
                PageStatus::Found => {}
                PageStatus::NotFound => return page - 1,
                PageStatus::Failed(reason) => {
                    warn!("Probe failed for {}: {}", url, reason);
                    return page - 1;
                }
            }
        }

        warn!(
            category = %category,
            "Reached scan cap ({} pages); recording the cap",
            self.max_pages
        );
        self.max_pages
    }
}
