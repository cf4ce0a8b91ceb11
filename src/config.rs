//! Sync configuration
//!
//! One explicit value loaded at startup and passed into the orchestrator.
//! Nothing reads configuration ambiently at call time.

use crate::error::{LeagueError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for one sync daemon instance, loaded from a JSON file:
///
/// ```json
/// {
///   "dataFolder": "/var/lib/league_sync",
///   "events": ["2020-07", "2020-08"],
///   "ownedDek": "owned.dek",
///   "wishlistDek": "wishlist.dek"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Root folder holding `events/<eventId>/*.txt` and the .dek exports
    pub data_folder: PathBuf,
    /// Event ids this instance manages; directories are created on sight
    #[serde(default)]
    pub events: Vec<String>,
    /// Collection export of owned cards, relative to `data_folder`
    #[serde(default)]
    pub owned_dek: Option<String>,
    /// Collection export of wishlist cards, relative to `data_folder`
    #[serde(default)]
    pub wishlist_dek: Option<String>,
}

impl SyncConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: SyncConfig = serde_json::from_str(&text)?;
        if config.data_folder.as_os_str().is_empty() {
            return Err(LeagueError::Config("dataFolder must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn events_dir(&self) -> PathBuf {
        self.data_folder.join("events")
    }

    pub fn event_dir(&self, event_id: &str) -> PathBuf {
        self.events_dir().join(event_id)
    }

    pub fn dek_path(&self, file_name: &str) -> PathBuf {
        self.data_folder.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "dataFolder": "/tmp/league",
                "events": ["2020-07"],
                "ownedDek": "owned.dek",
                "wishlistDek": "wishlist.dek"
            }"#,
        )
        .unwrap();

        let config = SyncConfig::load(&path).unwrap();
        assert_eq!(config.events, vec!["2020-07"]);
        assert_eq!(config.event_dir("2020-07"), PathBuf::from("/tmp/league/events/2020-07"));
        assert_eq!(config.dek_path("owned.dek"), PathBuf::from("/tmp/league/owned.dek"));
    }

    #[test]
    fn optional_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"dataFolder": "/tmp/league"}"#).unwrap();

        let config = SyncConfig::load(&path).unwrap();
        assert!(config.events.is_empty());
        assert!(config.owned_dek.is_none());
        assert!(config.wishlist_dek.is_none());
    }

    #[test]
    fn empty_data_folder_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"dataFolder": ""}"#).unwrap();
        assert!(matches!(SyncConfig::load(&path), Err(LeagueError::Config(_))));
    }
}
