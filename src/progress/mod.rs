pub mod calculator;
pub mod model;

pub use calculator::{
    category_progress, chapter_progress, in_syllabus_order, subject_progress, summarize,
    total_progress, ChapterSummary, OrderedChapters, ProgressSummary, SubjectSummary,
};
pub use model::{
    Category, ChapterMap, ChapterRecord, ChapterTag, ChapterUpdate, CompletionField, SubjectMap,
    WeakChapter,
};
