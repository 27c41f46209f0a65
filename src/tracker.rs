use crate::{
    log_error, log_info,
    persistence::{ProgressPersistence, UNKNOWN_SUBJECT},
    progress::{
        self, Category, ChapterMap, ChapterRecord, ChapterTag, ChapterUpdate, ProgressSummary,
        SubjectMap, WeakChapter,
    },
    storage::KeyValueStore,
    syllabus::Syllabus,
};

const ENABLE_LOGS: bool = true;

/// Single mutation and query surface over the study progress map.
///
/// Every mutation is written through to storage before it returns. Queries
/// recompute from the in-memory map, which stays authoritative for the
/// session if a write fails.
pub struct ProgressTracker<S> {
    persistence: ProgressPersistence<S>,
    subjects: SubjectMap,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    pub fn open(store: S, syllabus: Syllabus) -> Self {
        let persistence = ProgressPersistence::new(store, syllabus);
        let subjects = persistence.load();
        let mut tracker = Self {
            persistence,
            subjects,
        };
        tracker.import_weak_index();
        tracker
    }

    /// Folds a legacy weak list into chapter tags, then rewrites the list from
    /// tags so both agree from here on.
    ///
    /// A list this crate wrote (subject/chapter pairs, no `Unknown` subject)
    /// only mirrors the tags and is never read back into them.
    fn import_weak_index(&mut self) {
        let loaded = self.persistence.load_weak_chapters();
        let legacy = loaded.upgraded
            || loaded
                .chapters
                .iter()
                .any(|entry| entry.subject == UNKNOWN_SUBJECT);
        let candidates: &[WeakChapter] = if legacy { &loaded.chapters } else { &[] };
        let mut imported = 0usize;

        for entry in candidates {
            let targets: Vec<&mut ChapterRecord> = if entry.subject == UNKNOWN_SUBJECT {
                self.subjects
                    .values_mut()
                    .filter_map(|chapters| chapters.get_mut(&entry.chapter))
                    .collect()
            } else {
                self.subjects
                    .get_mut(&entry.subject)
                    .and_then(|chapters| chapters.get_mut(&entry.chapter))
                    .into_iter()
                    .collect()
            };

            for record in targets {
                if record.tag == ChapterTag::None {
                    record.tag = ChapterTag::Weak;
                    imported += 1;
                }
            }
        }

        if imported > 0 {
            log_info!("Imported {imported} weak chapters from the stored weak list");
            self.persist();
        } else if legacy || loaded.chapters != self.weak_chapters() {
            self.persist_weak_index();
        }
    }

    pub fn syllabus(&self) -> &Syllabus {
        self.persistence.syllabus()
    }

    pub fn subjects(&self) -> &SubjectMap {
        &self.subjects
    }

    pub fn chapters(&self, subject: &str) -> Option<&ChapterMap> {
        self.subjects.get(subject)
    }

    pub fn chapter(&self, subject: &str, chapter: &str) -> Option<&ChapterRecord> {
        self.subjects
            .get(subject)
            .and_then(|chapters| chapters.get(chapter))
    }

    /// Merges `update` into the chapter and persists. Unknown chapters are ignored.
    pub fn update_chapter_data(&mut self, subject: &str, chapter: &str, update: &ChapterUpdate) {
        self.mutate(subject, chapter, |record| update.apply_to(record));
    }

    /// Replaces the chapter with the zero record: nothing done, no tag, no remarks.
    pub fn reset_chapter(&mut self, subject: &str, chapter: &str) {
        self.mutate(subject, chapter, |record| *record = ChapterRecord::default());
    }

    /// Sets all ten completion fields; tag and remarks are kept.
    pub fn mark_chapter_complete(&mut self, subject: &str, chapter: &str) {
        self.mutate(subject, chapter, |record| record.mark_all(true));
    }

    pub fn set_tag(&mut self, subject: &str, chapter: &str, tag: ChapterTag) {
        self.update_chapter_data(subject, chapter, &ChapterUpdate::new().tag(tag));
    }

    pub fn set_remarks(&mut self, subject: &str, chapter: &str, remarks: impl Into<String>) {
        self.update_chapter_data(subject, chapter, &ChapterUpdate::new().remarks(remarks));
    }

    /// Zeroes every chapter and persists.
    pub fn reset_all(&mut self) {
        for record in self.subjects.values_mut().flat_map(|chapters| chapters.values_mut()) {
            *record = ChapterRecord::default();
        }
        log_info!("Reset progress for every chapter");
        self.persist();
    }

    fn mutate(&mut self, subject: &str, chapter: &str, apply: impl FnOnce(&mut ChapterRecord)) {
        let Some(record) = self
            .subjects
            .get_mut(subject)
            .and_then(|chapters| chapters.get_mut(chapter))
        else {
            log::debug!("Ignoring update for unknown chapter {subject}/{chapter}");
            return;
        };

        let tag_before = record.tag;
        apply(record);
        let tag_changed = record.tag != tag_before;

        self.save_subjects();
        if tag_changed {
            self.persist_weak_index();
        }
    }

    fn persist(&self) {
        self.save_subjects();
        self.persist_weak_index();
    }

    fn save_subjects(&self) {
        if let Err(err) = self.persistence.save(&self.subjects) {
            log_error!("Failed to persist progress; keeping in-memory state: {err:#}");
        }
    }

    fn persist_weak_index(&self) {
        if let Err(err) = self.persistence.save_weak_chapters(&self.weak_chapters()) {
            log_error!("Failed to persist weak chapters: {err:#}");
        }
    }

    pub fn category_progress(&self, subject: &str, chapter: &str, category: Category) -> f64 {
        progress::category_progress(self.chapter(subject, chapter), category)
    }

    pub fn chapter_progress(&self, subject: &str, chapter: &str) -> f64 {
        progress::chapter_progress(self.chapter(subject, chapter))
    }

    pub fn subject_progress(&self, subject: &str) -> f64 {
        progress::subject_progress(&self.subjects, subject)
    }

    pub fn total_progress(&self) -> f64 {
        progress::total_progress(&self.subjects)
    }

    pub fn summary(&self) -> ProgressSummary {
        progress::summarize(&self.subjects, self.syllabus())
    }

    /// Chapters currently tagged weak, in syllabus order.
    pub fn weak_chapters(&self) -> Vec<WeakChapter> {
        progress::in_syllabus_order(&self.subjects, self.syllabus())
            .into_iter()
            .flat_map(|(subject, chapters)| {
                chapters
                    .into_iter()
                    .filter(|(_, record)| record.tag == ChapterTag::Weak)
                    .map(move |(chapter, _)| WeakChapter::new(subject, chapter))
            })
            .collect()
    }
}
