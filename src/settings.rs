use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::timer::DEFAULT_TICK_INTERVAL;

pub const DEBUG_ENV_VAR: &str = "PREP_TRACKER_DEBUG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackerSettings {
    /// SQLite file for progress data. `None` keeps progress in memory only.
    pub database_path: Option<PathBuf>,
    pub tick_interval_ms: u64,
    pub debug_logging: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            debug_logging: false,
        }
    }
}

impl TrackerSettings {
    pub fn tick_interval(&self) -> Duration {
        if self.tick_interval_ms == 0 {
            DEFAULT_TICK_INTERVAL
        } else {
            Duration::from_millis(self.tick_interval_ms)
        }
    }

    /// Stored flag, forced on by `PREP_TRACKER_DEBUG=1|true`.
    pub fn debug_enabled(&self) -> bool {
        let from_env = std::env::var(DEBUG_ENV_VAR)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        self.debug_logging || from_env
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<TrackerSettings>,
}

impl SettingsStore {
    /// Missing or malformed files yield defaults; only an unreadable file is an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings at {}: {err}", path.display());
                TrackerSettings::default()
            })
        } else {
            TrackerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> TrackerSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: TrackerSettings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: TrackerSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &TrackerSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackerSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.settings(), TrackerSettings::default());
        assert_eq!(store.settings().tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn update_writes_through_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("roundtrip.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let settings = TrackerSettings {
            database_path: Some(PathBuf::from("/tmp/progress.sqlite3")),
            tick_interval_ms: 250,
            debug_logging: true,
        };
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.settings(), settings);
        reopened.reload().unwrap();
        assert_eq!(reopened.settings().tick_interval(), Duration::from_millis(250));
    }

    #[test]
    fn malformed_or_partial_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");

        fs::write(&path, r#"{"tick_interval_ms": 1000}"#).unwrap();
        let partial = SettingsStore::new(path.clone()).unwrap().settings();
        assert_eq!(partial.tick_interval_ms, 1000);
        assert_eq!(partial.database_path, None);

        fs::write(&path, "not json").unwrap();
        let fallback = SettingsStore::new(path.clone()).unwrap().settings();
        assert_eq!(fallback, TrackerSettings::default());
    }

    #[test]
    fn zero_interval_uses_default() {
        let settings = TrackerSettings {
            tick_interval_ms: 0,
            ..TrackerSettings::default()
        };
        assert_eq!(settings.tick_interval(), DEFAULT_TICK_INTERVAL);
    }
}
