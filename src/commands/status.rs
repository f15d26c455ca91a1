//! Status command implementation

use crate::config::Config;
use crate::store::{PageMapStore, SentLedger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Page map summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMapStatus {
    pub last_scan: DateTime<Utc>,
    pub next_scan: DateTime<Utc>,
    pub scan_due: bool,
    pub category_count: usize,
    pub total_pages: u64,
    pub empty_categories: Vec<String>,
}

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub data_dir: String,
    pub base_url: String,
    pub webhook_configured: bool,
    pub configured_categories: usize,
    pub send_interval_secs: u64,
    pub page_map: Option<PageMapStatus>,
    pub sent_count: usize,
    pub oldest_sent: Option<DateTime<Utc>>,
    pub newest_sent: Option<DateTime<Utc>>,
    pub expired_entries: usize,
}

/// Summarize persisted state without touching the network
pub fn cmd_status(config: &Config) -> StatusInfo {
    info!("Getting status");
    let now = Utc::now();

    let page_map = PageMapStore::new(config.page_map_path())
        .load()
        .map(|map| PageMapStatus {
            scan_due: map.is_due(now),
            category_count: map.categories.len(),
            total_pages: map.total_pages(),
            empty_categories: map
                .categories
                .iter()
                .filter(|(_, &pages)| pages == 0)
                .map(|(name, _)| name.clone())
                .collect(),
            last_scan: map.last_scan,
            next_scan: map.next_scan,
        });

    let ledger = SentLedger::load(config.ledger_path());

    StatusInfo {
        data_dir: config.data_dir.display().to_string(),
        base_url: config.base_url.clone(),
        webhook_configured: config.webhook_url().is_ok(),
        configured_categories: config.categories.len(),
        send_interval_secs: config.send_interval().as_secs(),
        page_map,
        sent_count: ledger.len(),
        oldest_sent: ledger.oldest(),
        newest_sent: ledger.newest(),
        expired_entries: ledger.count_expired(now, config.retention_days),
    }
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 anekdot-relay Status\n");
    println!("Data directory: {}", status.data_dir);
    println!("Site: {}", status.base_url);
    println!(
        "Webhook: {}",
        if status.webhook_configured {
            "✓ Configured"
        } else {
            "✗ Not set (WEBHOOK_URL)"
        }
    );
    println!("Categories: {}", status.configured_categories);
    println!("Send interval: {}s", status.send_interval_secs);

    println!("\nPage map:");
    match &status.page_map {
        Some(map) => {
            println!("  Last scan: {}", map.last_scan);
            println!(
                "  Next scan: {}{}",
                map.next_scan,
                if map.scan_due { " (due)" } else { "" }
            );
            println!("  Categories: {}", map.category_count);
            println!("  Total pages: {}", map.total_pages);
            if !map.empty_categories.is_empty() {
                println!("  ⚠ No pages: {}", map.empty_categories.join(", "));
            }
        }
        None => println!("  ✗ Missing (will be rebuilt on the next run)"),
    }

    println!("\nSent ledger:");
    println!("  Entries: {}", status.sent_count);
    if let (Some(oldest), Some(newest)) = (status.oldest_sent, status.newest_sent) {
        println!("  Oldest: {}", oldest);
        println!("  Newest: {}", newest);
    }
    println!("  Expired: {}", status.expired_entries);
}
