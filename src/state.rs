use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::krs::Krs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    pub last_numer_wpisu: u64,
}

/// Last seen entry number per KRS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchState(BTreeMap<Krs, StateEntry>);

impl WatchState {
    pub fn last_seen(&self, krs: &Krs) -> Option<u64> {
        self.0.get(krs).map(|entry| entry.last_numer_wpisu)
    }

    /// Whether `last` is news for `krs`: nothing recorded yet, or a higher entry.
    pub fn is_changed(&self, krs: &Krs, last: u64) -> bool {
        self.last_seen(krs).map_or(true, |previous| last > previous)
    }

    pub fn record(&mut self, krs: &Krs, last: u64) {
        self.0.insert(
            krs.clone(),
            StateEntry {
                last_numer_wpisu: last,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// JSON file holding the [`WatchState`] between runs.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state; a missing or unreadable file starts from scratch.
    pub fn load(&self) -> WatchState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::info!("No state at {} ({}), starting empty", self.path.display(), e);
                return WatchState::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Ignoring corrupt state file {}: {}", self.path.display(), e);
                WatchState::default()
            }
        }
    }

    /// Writes the state next to the target and renames it into place.
    pub fn save(&self, state: &WatchState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move state into {}", self.path.display()))?;
        log::debug!("Saved state for {} KRS numbers to {:?}", state.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn krs(raw: &str) -> Krs {
        Krs::new(raw).unwrap()
    }

    #[test]
    fn test_is_changed() {
        let mut state = WatchState::default();
        assert!(state.is_changed(&krs("1"), 3));
        state.record(&krs("1"), 3);
        assert!(!state.is_changed(&krs("1"), 3));
        assert!(!state.is_changed(&krs("1"), 2));
        assert!(state.is_changed(&krs("1"), 4));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));
        let mut state = WatchState::default();
        state.record(&krs("28098"), 41);
        store.save(&state).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(raw["0000028098"]["lastNumerWpisu"], 41);
        assert_eq!(store.load(), state);
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn test_missing_or_corrupt_state_is_empty() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.load().is_empty());

        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());
    }
}
