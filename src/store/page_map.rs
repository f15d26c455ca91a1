//! Cached page counts per category

use super::{read_json, write_json};
use crate::error::Result;
use crate::models::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// How many listing pages each category had at the last scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMap {
    #[serde(with = "timestamp")]
    pub last_scan: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub next_scan: DateTime<Utc>,
    #[serde(default)]
    pub categories: BTreeMap<String, u32>,
}

impl PageMap {
    /// Stamp a fresh scan. `next_scan` never precedes `last_scan`: negative
    /// intervals count as zero and an out-of-range sum falls back to the
    /// scan time.
    pub fn new(
        scanned_at: DateTime<Utc>,
        refresh_interval: chrono::Duration,
        categories: BTreeMap<String, u32>,
    ) -> Self {
        let interval = refresh_interval.max(chrono::Duration::zero());
        Self {
            last_scan: scanned_at,
            next_scan: scanned_at
                .checked_add_signed(interval)
                .unwrap_or(scanned_at),
            categories,
        }
    }

    /// Known page count for a category
    pub fn count(&self, category: &str) -> Option<u32> {
        self.categories.get(category).copied()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_scan
    }

    pub fn total_pages(&self) -> u64 {
        self.categories.values().map(|&n| n as u64).sum()
    }
}

/// Owns the page map file
#[derive(Debug, Clone)]
pub struct PageMapStore {
    path: PathBuf,
}

impl PageMapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted map; `None` means the caller must rescan.
    ///
    /// An empty category table counts as absent as well.
    pub fn load(&self) -> Option<PageMap> {
        let map: PageMap = read_json(&self.path).ok()?;
        if map.categories.is_empty() {
            info!("{} has no categories, rescan needed", self.path.display());
            return None;
        }
        Some(map)
    }

    pub fn try_save(&self, map: &PageMap) -> Result<()> {
        write_json(&self.path, map)
    }

    /// Persist the map; failures are logged and the in-memory copy stays authoritative
    pub fn save(&self, map: &PageMap) {
        match self.try_save(map) {
            Ok(()) => info!("Category page map saved to {}", self.path.display()),
            Err(e) => error!("Failed to write {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> PageMap {
        let scanned = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let mut categories = BTreeMap::new();
        categories.insert("blondinki".to_string(), 5);
        categories.insert("armiya".to_string(), 12);
        PageMap::new(scanned, chrono::Duration::hours(12), categories)
    }

    #[test]
    fn test_load_missing_empty_and_malformed_is_absent() {
        let tmp = TempDir::new().unwrap();
        let store = PageMapStore::new(tmp.path().join("category_pages.json"));
        assert!(store.load().is_none());

        std::fs::write(store.path(), b"").unwrap();
        assert!(store.load().is_none());

        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_none());

        std::fs::write(store.path(), r#"{"categories": {"a": 1}}"#).unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_empty_category_table_is_absent() {
        let tmp = TempDir::new().unwrap();
        let store = PageMapStore::new(tmp.path().join("category_pages.json"));
        let mut map = sample();
        map.categories.clear();
        store.save(&map);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = PageMapStore::new(tmp.path().join("category_pages.json"));
        let map = sample();
        store.save(&map);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, map);
        assert_eq!(loaded.count("blondinki"), Some(5));
        assert_eq!(loaded.count("unknown"), None);
        assert_eq!(loaded.total_pages(), 17);
        assert!(loaded.next_scan > loaded.last_scan);
    }

    #[test]
    fn test_reads_naive_timestamps() {
        let tmp = TempDir::new().unwrap();
        let store = PageMapStore::new(tmp.path().join("category_pages.json"));
        std::fs::write(
            store.path(),
            r#"{
  "last_scan": "2025-05-01T08:00:00.123456",
  "next_scan": "2025-05-01T20:00:00.123456",
  "categories": {"blondinki": 5}
}"#,
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.is_due(Utc.with_ymd_and_hms(2025, 5, 1, 20, 0, 1).unwrap()));
        assert!(!loaded.is_due(Utc.with_ymd_and_hms(2025, 5, 1, 19, 0, 0).unwrap()));
    }

    #[test]
    fn test_next_scan_never_precedes_last_scan() {
        let scanned = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();

        let map = PageMap::new(scanned, chrono::Duration::hours(-1), BTreeMap::new());
        assert_eq!(map.next_scan, scanned);

        let map = PageMap::new(scanned, chrono::Duration::MAX, BTreeMap::new());
        assert!(map.next_scan >= map.last_scan);

        let map = PageMap::new(scanned, chrono::Duration::hours(12), BTreeMap::new());
        assert_eq!(map.next_scan, scanned + chrono::Duration::hours(12));
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        // A directory in place of the file makes the rename fail.
        let path = tmp.path().join("category_pages.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        let store = PageMapStore::new(&path);
        store.save(&sample());
        assert!(store.try_save(&sample()).is_err());
    }
}
