//! Persisted state: the category page map and the sent ledger
//!
//! Both files are JSON, replaced whole on every save (temp file + rename),
//! and read with an absent-on-corruption contract: a missing, empty or
//! malformed file is reported as absent instead of an error.

mod ledger;
mod page_map;

pub use ledger::*;
pub use page_map::*;

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, warn};

/// Why a persisted file could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absent {
    Missing,
    Empty,
    Corrupt,
}

/// Read raw file content, classifying missing and blank files
pub(crate) fn read_content(path: &Path) -> std::result::Result<String, Absent> {
    if !path.exists() {
        debug!("{} does not exist", path.display());
        return Err(Absent::Missing);
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        Absent::Corrupt
    })?;

    if content.trim().is_empty() {
        warn!("{} is empty", path.display());
        return Err(Absent::Empty);
    }

    Ok(content)
}

/// Read and parse a JSON file, degrading every failure to [`Absent`]
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> std::result::Result<T, Absent> {
    let content = read_content(path)?;
    serde_json::from_str(&content).map_err(|e| {
        error!("Failed to parse {}: {}", path.display(), e);
        Absent::Corrupt
    })
}

/// Serialize to pretty JSON and replace the file in one rename
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
