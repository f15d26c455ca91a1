//! The delivery loop
//!
//! Each cycle runs the same sequence of steps:
//! connectivity check, page-map refresh when due, category selection,
//! fetch, dedup filter, delivery, and ledger persistence. The loop then
//! sleeps for the delivery interval (or the shorter offline backoff) and
//! starts over. It has no terminal state of its own; it ends only when the
//! shutdown future passed to [`DeliveryLoop::run_until`] resolves.

use crate::config::Config;
use crate::crawl::{Connectivity, Fetcher, Scanner, SiteClient};
use crate::error::{Error, Result};
use crate::models::Item;
use crate::notify::Notifier;
use crate::retry::RetryPolicy;
use crate::store::{PageMap, PageMapStore, SentLedger};
use chrono::Utc;
use rand::seq::IndexedRandom;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Connectivity check failed; nothing else ran
    Offline,
    /// Every fetched item had already been sent, or nothing was fetched
    NoNewItems { category: String },
    /// The notifier rejected the item; it stays eligible
    DeliveryFailed { id: String },
    Delivered { id: String, category: String },
}

/// Orchestrates scanning, fetching, dedup and delivery
pub struct DeliveryLoop<N: Notifier> {
    config: Config,
    connectivity: Connectivity,
    scanner: Scanner,
    fetcher: Fetcher,
    notifier: N,
    retry: RetryPolicy,
    page_map: Option<PageMap>,
    ledger: SentLedger,
}

impl<N: Notifier> DeliveryLoop<N> {
    /// Build the loop from configuration and load persisted state.
    ///
    /// A missing page map is not scanned here; the first online cycle does it.
    pub fn new(config: Config, notifier: N) -> Result<Self> {
        let webhook = config.webhook_url()?;
        let connectivity = Connectivity::new(&config, &webhook)?;
        let site = SiteClient::new(&config.base_url, &config.http)?;
        let page_store = PageMapStore::new(config.page_map_path());
        let scanner = Scanner::new(site.clone(), page_store.clone(), &config);
        let fetcher = Fetcher::new(site, &config);

        let page_map = page_store.load();
        let ledger = SentLedger::load(config.ledger_path());

        Ok(Self {
            retry: config.retry.policy(),
            config,
            connectivity,
            scanner,
            fetcher,
            notifier,
            page_map,
            ledger,
        })
    }

    pub fn ledger(&self) -> &SentLedger {
        &self.ledger
    }

    pub fn page_map(&self) -> Option<&PageMap> {
        self.page_map.as_ref()
    }

    /// Run cycles until `shutdown` resolves
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.run() => {}
            _ = shutdown => info!("Stop requested, relay shutting down"),
        }
    }

    /// Run cycles forever
    pub async fn run(&mut self) {
        info!(
            categories = self.config.categories.len(),
            interval_secs = self.config.send_interval().as_secs(),
            "Relay started"
        );

        loop {
            let outcome = self.run_cycle().await;
            let pause = self.pause_after(&outcome);
            debug!(?outcome, pause_secs = pause.as_secs(), "Cycle finished");
            tokio::time::sleep(pause).await;
        }
    }

    fn pause_after(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Offline => self.config.offline_backoff(),
            _ => self.config.send_interval(),
        }
    }

    /// One pass from the connectivity check through persistence
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        if !self.connectivity.check().await {
            warn!("Offline, skipping cycle");
            return CycleOutcome::Offline;
        }

        self.maybe_rescan().await;

        let category = self.select_category();
        let page_count = self.page_count(&category);
        let items = self.fetcher.fetch(&category, page_count).await;
        let fetched = items.len();

        let fresh = self.ledger.filter_unsent(items);
        if fresh.is_empty() {
            info!(category = %category, fetched, "No new items");
            return CycleOutcome::NoNewItems { category };
        }

        let Some(item) = choose_item(&fresh) else {
            return CycleOutcome::NoNewItems { category };
        };

        if let Err(e) = self.deliver(&item).await {
            error!(id = %item.id, "Delivery failed: {}", e);
            return CycleOutcome::DeliveryFailed { id: item.id };
        }

        self.persist(&item);
        info!(id = %item.id, category = %category, "Item delivered");
        CycleOutcome::Delivered {
            id: item.id,
            category,
        }
    }

    async fn maybe_rescan(&mut self) {
        let now = Utc::now();
        let due = match &self.page_map {
            Some(map) => map.is_due(now),
            None => true,
        };
        if due {
            info!("Refreshing category page map");
            self.page_map = Some(self.scanner.scan(&self.config.categories).await);
        }
    }

    fn select_category(&self) -> String {
        let mut rng = rand::rng();
        self.config
            .categories
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default()
    }

    fn page_count(&self, category: &str) -> u32 {
        self.page_map
            .as_ref()
            .and_then(|map| map.count(category))
            .unwrap_or(self.config.fallback_page_count)
    }

    async fn deliver(&self, item: &Item) -> Result<()> {
        self.retry
            .run(
                "deliver",
                || self.notifier.notify(&item.text),
                Error::is_transient,
            )
            .await
    }

    fn persist(&mut self, item: &Item) {
        let now = Utc::now();
        self.ledger.record(item.id.clone(), item.text.clone(), now);
        self.ledger.purge(now, self.config.retention_days);
        self.ledger.save();
    }
}

fn choose_item(items: &[Item]) -> Option<Item> {
    let mut rng = rand::rng();
    items.choose(&mut rng).cloned()
}
