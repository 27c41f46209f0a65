//! Versioned load/save of the progress map and the weak-chapter index.
//!
//! Loads never fail: unreadable, missing, or stale-schema data falls back to
//! the syllabus template (or an empty list) and the reason is logged.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    log_info, log_warn,
    progress::{SubjectMap, WeakChapter},
    storage::KeyValueStore,
    syllabus::Syllabus,
};

const ENABLE_LOGS: bool = true;

pub const PROGRESS_KEY: &str = "progress_data";
pub const VERSION_KEY: &str = "progress_version";
pub const WEAK_CHAPTERS_KEY: &str = "weak_chapters";

/// Bumped whenever the stored map shape changes; any mismatch resets to the template.
pub const SCHEMA_VERSION: &str = "2";

/// Subject assigned to weak chapters stored before subjects were recorded.
pub const UNKNOWN_SUBJECT: &str = "Unknown";

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredWeakEntry {
    Pair(WeakChapter),
    Legacy(String),
}

/// Weak-chapter index as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedWeakChapters {
    pub chapters: Vec<WeakChapter>,
    /// At least one entry was in the legacy bare-name format.
    pub upgraded: bool,
}

pub struct ProgressPersistence<S> {
    store: S,
    syllabus: Syllabus,
}

impl<S: KeyValueStore> ProgressPersistence<S> {
    pub fn new(store: S, syllabus: Syllabus) -> Self {
        Self { store, syllabus }
    }

    pub fn syllabus(&self) -> &Syllabus {
        &self.syllabus
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load(&self) -> SubjectMap {
        match self.try_load() {
            Ok(Some(map)) => map,
            Ok(None) => {
                log_info!("No stored progress with schema {SCHEMA_VERSION}; seeding from syllabus");
                self.syllabus.template()
            }
            Err(err) => {
                log_warn!("Stored progress is unreadable, using syllabus defaults: {err:#}");
                self.syllabus.template()
            }
        }
    }

    fn try_load(&self) -> Result<Option<SubjectMap>> {
        let version = self.store.get(VERSION_KEY)?;
        if version.as_deref() != Some(SCHEMA_VERSION) {
            if let Some(found) = version {
                log_warn!("Progress schema version '{found}' does not match '{SCHEMA_VERSION}'");
            }
            return Ok(None);
        }

        let Some(raw) = self.store.get(PROGRESS_KEY)? else {
            return Ok(None);
        };

        let map = serde_json::from_str(&raw).context("failed to parse stored progress")?;
        Ok(Some(map))
    }

    /// Writes the full map and the schema tag.
    pub fn save(&self, subjects: &SubjectMap) -> Result<()> {
        let serialized = serde_json::to_string(subjects).context("failed to serialize progress")?;
        self.store.set(PROGRESS_KEY, &serialized)?;
        self.store.set(VERSION_KEY, SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn load_weak_chapters(&self) -> LoadedWeakChapters {
        match self.try_load_weak_chapters() {
            Ok(loaded) => {
                if loaded.upgraded {
                    log_info!(
                        "Upgraded {} legacy weak chapter entries to subject/chapter pairs",
                        loaded.chapters.len()
                    );
                }
                loaded
            }
            Err(err) => {
                log_warn!("Stored weak chapters are unreadable, starting empty: {err:#}");
                LoadedWeakChapters::default()
            }
        }
    }

    fn try_load_weak_chapters(&self) -> Result<LoadedWeakChapters> {
        let Some(raw) = self.store.get(WEAK_CHAPTERS_KEY)? else {
            return Ok(LoadedWeakChapters::default());
        };

        let entries: Vec<StoredWeakEntry> =
            serde_json::from_str(&raw).context("failed to parse stored weak chapters")?;

        let mut upgraded = false;
        let chapters = entries
            .into_iter()
            .map(|entry| match entry {
                StoredWeakEntry::Pair(pair) => pair,
                StoredWeakEntry::Legacy(chapter) => {
                    upgraded = true;
                    WeakChapter::new(UNKNOWN_SUBJECT, chapter)
                }
            })
            .collect();

        Ok(LoadedWeakChapters { chapters, upgraded })
    }

    pub fn save_weak_chapters(&self, chapters: &[WeakChapter]) -> Result<()> {
        let serialized =
            serde_json::to_string(chapters).context("failed to serialize weak chapters")?;
        self.store.set(WEAK_CHAPTERS_KEY, &serialized)
    }

    /// Drops every persisted record; the next load yields the template.
    pub fn clear(&self) -> Result<()> {
        for key in [PROGRESS_KEY, VERSION_KEY, WEAK_CHAPTERS_KEY] {
            self.store.remove(key)?;
        }
        Ok(())
    }
}
