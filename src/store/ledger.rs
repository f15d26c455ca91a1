//! Record of delivered items, used for deduplication

use super::{read_content, write_json, Absent};
use crate::error::Result;
use crate::models::{timestamp, Item};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A delivered item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub text: String,
    #[serde(rename = "timestamp", with = "timestamp")]
    pub delivered_at: DateTime<Utc>,
}

/// Delivered item ids with their delivery time, persisted as one JSON object
#[derive(Debug, Clone)]
pub struct SentLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl SentLedger {
    /// An empty ledger bound to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the ledger; any unreadable file yields an empty ledger
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut ledger = Self::new(path);
        match read_entries(&ledger.path) {
            Ok(entries) => {
                info!("Loaded {} sent entries", entries.len());
                ledger.entries = entries;
            }
            Err(Absent::Missing) => debug!("No sent ledger yet, starting empty"),
            Err(_) => warn!("Starting with an empty sent ledger"),
        }
        ledger
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    /// Insert or overwrite the entry for `id`
    pub fn record(&mut self, id: impl Into<String>, text: impl Into<String>, now: DateTime<Utc>) {
        self.entries.insert(
            id.into(),
            LedgerEntry {
                text: text.into(),
                delivered_at: now,
            },
        );
    }

    /// Drop entries delivered strictly before `now - retention_days`.
    ///
    /// An entry exactly `retention_days` old is kept. Returns how many were removed.
    pub fn purge(&mut self, now: DateTime<Utc>, retention_days: u32) -> usize {
        let cutoff = now - chrono::Duration::days(retention_days as i64);
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.delivered_at >= cutoff);
        let removed = before - self.entries.len();
        if removed > 0 {
            info!(removed, remaining = self.entries.len(), "Purged expired sent entries");
        }
        removed
    }

    /// Number of entries [`SentLedger::purge`] would remove
    pub fn count_expired(&self, now: DateTime<Utc>, retention_days: u32) -> usize {
        let cutoff = now - chrono::Duration::days(retention_days as i64);
        self.entries
            .values()
            .filter(|entry| entry.delivered_at < cutoff)
            .count()
    }

    /// Keep only items whose id has not been delivered yet
    pub fn filter_unsent(&self, items: Vec<Item>) -> Vec<Item> {
        items
            .into_iter()
            .filter(|item| !self.contains(&item.id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|e| e.delivered_at).min()
    }

    pub fn newest(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|e| e.delivered_at).max()
    }

    pub fn try_save(&self) -> Result<()> {
        write_json(&self.path, &self.entries)
    }

    /// Persist the ledger; failures are logged and the in-memory copy stays authoritative
    pub fn save(&self) {
        match self.try_save() {
            Ok(()) => debug!("Sent ledger saved ({} entries)", self.entries.len()),
            Err(e) => error!("Failed to write {}: {}", self.path.display(), e),
        }
    }
}

fn read_entries(path: &Path) -> std::result::Result<BTreeMap<String, LedgerEntry>, Absent> {
    let content = read_content(path)?;

    match serde_json::from_str(&content) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            if serde_json::from_str::<BTreeMap<String, Vec<String>>>(&content).is_ok() {
                set_aside_legacy(path);
            } else {
                error!("Failed to parse {}: {}", path.display(), e);
            }
            Err(Absent::Corrupt)
        }
    }
}

/// Move a category-keyed ledger out of the way so the first save
/// does not destroy it.
fn set_aside_legacy(path: &Path) {
    let mut aside = path.as_os_str().to_owned();
    aside.push(".legacy");
    let aside = PathBuf::from(aside);

    match std::fs::rename(path, &aside) {
        Ok(()) => warn!(
            "{} uses the category-keyed format without item ids; moved it to {}",
            path.display(),
            aside.display()
        ),
        Err(e) => error!(
            "{} uses the category-keyed format and could not be moved aside: {}",
            path.display(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_record_and_contains() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = SentLedger::new(tmp.path().join("sent.json"));
        assert!(!ledger.contains("42"));

        ledger.record("42", "first", now());
        ledger.record("42", "second", now());
        assert!(ledger.contains("42"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("42").unwrap().text, "second");
    }

    #[test]
    fn test_purge_boundary_keeps_exactly_retention_old() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = SentLedger::new(tmp.path().join("sent.json"));
        let now = now();

        ledger.record("old", "a", now - chrono::Duration::days(30) - chrono::Duration::seconds(1));
        ledger.record("edge", "b", now - chrono::Duration::days(30));
        ledger.record("recent", "c", now - chrono::Duration::days(2));
        ledger.record("fresh", "d", now);

        assert_eq!(ledger.count_expired(now, 30), 1);
        assert_eq!(ledger.purge(now, 30), 1);
        assert!(!ledger.contains("old"));
        assert!(ledger.contains("edge"));
        assert!(ledger.contains("recent"));
        assert!(ledger.contains("fresh"));
    }

    #[test]
    fn test_filter_unsent() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = SentLedger::new(tmp.path().join("sent.json"));
        ledger.record("1", "A", now());

        let items = vec![Item::new("1", "A"), Item::new("2", "B")];
        assert_eq!(ledger.filter_unsent(items), vec![Item::new("2", "B")]);
    }

    #[test]
    fn test_save_and_load_file_format() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent.json");
        let mut ledger = SentLedger::new(&path);
        ledger.record("7", "joke", now());
        ledger.save();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["7"]["text"], "joke");
        assert_eq!(raw["7"]["timestamp"], "2025-06-30T12:00:00+00:00");

        let loaded = SentLedger::load(&path);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("7").unwrap().delivered_at, now());
        assert_eq!(loaded.oldest(), Some(now()));
        assert_eq!(loaded.newest(), Some(now()));
    }

    #[test]
    fn test_unreadable_files_load_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent.json");
        assert!(SentLedger::load(&path).is_empty());

        std::fs::write(&path, "").unwrap();
        assert!(SentLedger::load(&path).is_empty());

        std::fs::write(&path, "[1, 2").unwrap();
        assert!(SentLedger::load(&path).is_empty());
    }

    #[test]
    fn test_legacy_ledger_is_moved_aside() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent_anekdots.json");
        let legacy = r#"{"blondinki": ["joke one", "joke two"]}"#;
        std::fs::write(&path, legacy).unwrap();

        let mut ledger = SentLedger::load(&path);
        assert!(ledger.is_empty());

        let aside = tmp.path().join("sent_anekdots.json.legacy");
        assert_eq!(std::fs::read_to_string(&aside).unwrap(), legacy);
        assert!(!path.exists());

        ledger.record("7", "new joke", now());
        ledger.try_save().unwrap();
        assert_eq!(std::fs::read_to_string(&aside).unwrap(), legacy);
        assert!(SentLedger::load(&path).contains("7"));
    }
}
