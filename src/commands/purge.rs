//! Purge command - apply ledger retention now

use crate::config::Config;
use crate::error::Result;
use crate::store::SentLedger;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Purge statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeStats {
    pub entries_checked: usize,
    pub entries_removed: usize,
    pub retention_days: u32,
}

/// Remove ledger entries older than the retention window
pub fn cmd_purge(config: &Config, dry_run: bool) -> Result<PurgeStats> {
    info!(dry_run, "Starting purge operation");

    let now = Utc::now();
    let mut ledger = SentLedger::load(config.ledger_path());
    let entries_checked = ledger.len();

    let entries_removed = if dry_run {
        ledger.count_expired(now, config.retention_days)
    } else {
        let removed = ledger.purge(now, config.retention_days);
        if removed > 0 {
            ledger.try_save()?;
        }
        removed
    };

    Ok(PurgeStats {
        entries_checked,
        entries_removed,
        retention_days: config.retention_days,
    })
}

/// Print purge statistics
pub fn print_purge_stats(stats: &PurgeStats, dry_run: bool) {
    if dry_run {
        println!("\n🔍 Dry run - no changes made\n");
    } else {
        println!("\n✓ Purge complete\n");
    }

    println!("  Retention: {} days", stats.retention_days);
    println!("  Entries checked: {}", stats.entries_checked);
    println!(
        "  Entries {}: {}",
        if dry_run { "to remove" } else { "removed" },
        stats.entries_removed
    );
}
