//! Study progress tracking for exam preparation plus a countdown timer that
//! survives suspension.
//!
//! Hosts build one [`StudyContext`] at startup and hand it down to their UI;
//! nothing in the crate is a global.

pub mod persistence;
pub mod progress;
pub mod settings;
pub mod storage;
pub mod syllabus;
pub mod timer;
pub mod tracker;
pub mod utils;

use std::{sync::Arc, time::Duration};

use anyhow::Result;

pub use progress::{
    Category, ChapterRecord, ChapterTag, ChapterUpdate, CompletionField, ProgressSummary,
    SubjectMap, WeakChapter,
};
pub use settings::{SettingsStore, TrackerSettings};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use syllabus::Syllabus;
pub use timer::{ReliableTimer, TimerCallbacks, TimerSnapshot, TimerStatus};
pub use tracker::ProgressTracker;
pub use utils::init_logging;

pub type SharedStore = Arc<dyn KeyValueStore>;

/// Session-lived owner of the progress tracker and timer configuration.
pub struct StudyContext {
    pub tracker: ProgressTracker<SharedStore>,
    settings: TrackerSettings,
}

impl StudyContext {
    /// Installs logging, opens the configured store, and loads progress.
    pub fn open(settings: TrackerSettings, syllabus: Syllabus) -> Result<Self> {
        init_logging(settings.debug_enabled());

        let store: SharedStore = match &settings.database_path {
            Some(path) => Arc::new(SqliteStore::open(path.clone())?),
            None => {
                log::info!("No database path configured; progress lives in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self {
            tracker: ProgressTracker::open(store, syllabus),
            settings,
        })
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// New timer ticking at the configured interval. Needs a tokio runtime.
    pub fn new_timer(&self, total: Duration, callbacks: TimerCallbacks) -> Result<ReliableTimer> {
        Ok(ReliableTimer::new(total, callbacks)?.with_tick_interval(self.settings.tick_interval()))
    }
}
