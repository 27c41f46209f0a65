//! Percentage roll-ups over a [`SubjectMap`] snapshot.
//!
//! Everything here is an unweighted mean: each chapter counts the same
//! inside its subject and each subject counts the same in the total,
//! whatever its syllabus weight.

use serde::Serialize;

use super::model::{Category, ChapterMap, ChapterRecord, CompletionField, SubjectMap};
use crate::syllabus::Syllabus;

fn percent(done: usize, of: usize) -> f64 {
    if of == 0 {
        return 0.0;
    }
    (done * 100) as f64 / of as f64
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Share of the category's fixed fields that are set. 0 for a missing record.
pub fn category_progress(record: Option<&ChapterRecord>, category: Category) -> f64 {
    let Some(record) = record else {
        return 0.0;
    };
    let fields = category.fields();
    let done = fields.iter().filter(|field| record.get(**field)).count();
    percent(done, fields.len())
}

/// Share of all ten completion fields that are set. Tag and remarks never count.
pub fn chapter_progress(record: Option<&ChapterRecord>) -> f64 {
    match record {
        Some(record) => percent(record.completed_count(), CompletionField::ALL.len()),
        None => 0.0,
    }
}

pub fn subject_progress(subjects: &SubjectMap, subject: &str) -> f64 {
    match subjects.get(subject) {
        Some(chapters) => mean(chapters.values().map(|record| chapter_progress(Some(record)))),
        None => 0.0,
    }
}

pub fn total_progress(subjects: &SubjectMap) -> f64 {
    mean(subjects.keys().map(|name| subject_progress(subjects, name)))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub name: String,
    pub progress: f64,
    pub tag: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub name: String,
    pub progress: f64,
    pub completed_chapters: usize,
    pub chapter_count: usize,
    /// Per-category mean over the subject's chapters, in [`Category::ALL`] order.
    pub categories: Vec<(Category, f64)>,
    pub chapters: Vec<ChapterSummary>,
}

/// Everything a dashboard renders, computed from one snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total: f64,
    pub subjects: Vec<SubjectSummary>,
}

/// Chapters of one subject, in syllabus order.
pub type OrderedChapters<'a> = Vec<(&'a str, &'a ChapterRecord)>;

/// Walks `subjects` in syllabus order. Subjects and chapters the syllabus
/// does not list follow in map order.
pub fn in_syllabus_order<'a>(
    subjects: &'a SubjectMap,
    syllabus: &'a Syllabus,
) -> Vec<(&'a str, OrderedChapters<'a>)> {
    let listed = syllabus.subjects();
    let mut ordered: Vec<_> = listed
        .iter()
        .filter_map(|entry| {
            let chapters = subjects.get(&entry.name)?;
            Some((entry.name.as_str(), chapters_in_order(chapters, &entry.chapters)))
        })
        .collect();

    ordered.extend(
        subjects
            .iter()
            .filter(|(name, _)| !listed.iter().any(|entry| &entry.name == *name))
            .map(|(name, chapters)| (name.as_str(), chapters_in_order(chapters, &[]))),
    );
    ordered
}

fn chapters_in_order<'a>(chapters: &'a ChapterMap, order: &[String]) -> OrderedChapters<'a> {
    let mut ordered: OrderedChapters<'a> = Vec::with_capacity(chapters.len());
    for name in order {
        if let Some((name, record)) = chapters.get_key_value(name) {
            if !ordered.iter().any(|(seen, _)| *seen == name.as_str()) {
                ordered.push((name.as_str(), record));
            }
        }
    }
    ordered.extend(
        chapters
            .iter()
            .filter(|(name, _)| !order.contains(*name))
            .map(|(name, record)| (name.as_str(), record)),
    );
    ordered
}

/// Summary of `subjects`, laid out in the syllabus order the UI shows.
pub fn summarize(subjects: &SubjectMap, syllabus: &Syllabus) -> ProgressSummary {
    let subject_summaries = in_syllabus_order(subjects, syllabus)
        .into_iter()
        .map(|(name, chapters)| {
            let categories = Category::ALL
                .into_iter()
                .map(|category| {
                    let value = mean(
                        chapters
                            .iter()
                            .map(|(_, record)| category_progress(Some(*record), category)),
                    );
                    (category, value)
                })
                .collect();

            SubjectSummary {
                name: name.to_owned(),
                progress: subject_progress(subjects, name),
                completed_chapters: chapters.iter().filter(|(_, r)| r.is_complete()).count(),
                chapter_count: chapters.len(),
                categories,
                chapters: chapters
                    .iter()
                    .map(|(chapter, record)| ChapterSummary {
                        name: (*chapter).to_owned(),
                        progress: chapter_progress(Some(*record)),
                        tag: record.tag.as_str(),
                    })
                    .collect(),
            }
        })
        .collect();

    ProgressSummary {
        total: total_progress(subjects),
        subjects: subject_summaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::model::{ChapterMap, ChapterTag};

    fn record_with(fields: &[CompletionField]) -> ChapterRecord {
        let mut record = ChapterRecord::default();
        for field in fields {
            record.set(*field, true);
        }
        record
    }

    fn subject_of(records: Vec<ChapterRecord>) -> ChapterMap {
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| (format!("Chapter {i}"), record))
            .collect()
    }

    #[test]
    fn chapter_progress_bounds() {
        let empty = ChapterRecord::default();
        assert_eq!(chapter_progress(Some(&empty)), 0.0);

        let mut full = ChapterRecord::default();
        full.mark_all(true);
        assert_eq!(chapter_progress(Some(&full)), 100.0);

        assert_eq!(chapter_progress(None), 0.0);
    }

    #[test]
    fn chapter_progress_counts_revise_fields_and_ignores_tag() {
        let mut record = record_with(&[CompletionField::RevisedMains, CompletionField::RevisedAdv]);
        record.tag = ChapterTag::Strong;
        record.remarks = "ok".into();
        assert_eq!(chapter_progress(Some(&record)), 20.0);
    }

    #[test]
    fn category_progress_only_sees_its_own_fields() {
        let mut record = record_with(&[CompletionField::PyqMains]);
        assert_eq!(category_progress(Some(&record), Category::Tests), 25.0);

        for field in CompletionField::ALL {
            if field.category() != Category::Tests {
                record.set(field, true);
            }
        }
        assert_eq!(category_progress(Some(&record), Category::Tests), 25.0);
        assert_eq!(category_progress(Some(&record), Category::Learn), 100.0);
        assert_eq!(category_progress(None, Category::Learn), 0.0);
    }

    #[test]
    fn subject_progress_is_unweighted_mean() {
        let mut full = ChapterRecord::default();
        full.mark_all(true);
        let half = record_with(&[
            CompletionField::Notes,
            CompletionField::ShortNotes,
            CompletionField::Modules,
            CompletionField::Ncert,
            CompletionField::PyqMains,
        ]);

        let mut subjects = SubjectMap::new();
        subjects.insert("Physics".into(), subject_of(vec![full, half]));
        assert_eq!(subject_progress(&subjects, "Physics"), 75.0);

        subjects
            .get_mut("Physics")
            .unwrap()
            .insert("Extra".into(), ChapterRecord::default());
        assert_eq!(subject_progress(&subjects, "Physics"), 50.0);
    }

    #[test]
    fn empty_subject_and_unknown_subject_are_zero() {
        let mut subjects = SubjectMap::new();
        subjects.insert("Biology".into(), ChapterMap::new());
        assert_eq!(subject_progress(&subjects, "Biology"), 0.0);
        assert_eq!(subject_progress(&subjects, "Astronomy"), 0.0);
    }

    #[test]
    fn total_progress_of_empty_and_single_subject() {
        let mut subjects = SubjectMap::new();
        assert_eq!(total_progress(&subjects), 0.0);

        subjects.insert(
            "Chemistry".into(),
            subject_of(vec![record_with(&[CompletionField::Notes]), ChapterRecord::default()]),
        );
        assert_eq!(total_progress(&subjects), subject_progress(&subjects, "Chemistry"));
        assert_eq!(total_progress(&subjects), 5.0);
    }

    #[test]
    fn total_progress_weights_subjects_equally() {
        let mut full = ChapterRecord::default();
        full.mark_all(true);

        let mut subjects = SubjectMap::new();
        subjects.insert("Physics".into(), subject_of(vec![full]));
        subjects.insert(
            "Mathematics".into(),
            subject_of(vec![ChapterRecord::default(); 9]),
        );
        assert_eq!(total_progress(&subjects), 50.0);
    }

    #[test]
    fn summary_reports_categories_and_completed_chapters() {
        let mut full = ChapterRecord::default();
        full.mark_all(true);
        let learn_only = record_with(&[CompletionField::Notes, CompletionField::ShortNotes]);

        let mut subjects = SubjectMap::new();
        subjects.insert("Physics".into(), subject_of(vec![full, learn_only]));

        let summary = summarize(&subjects, &Syllabus::new(Vec::new()));
        assert_eq!(summary.total, 60.0);
        let physics = &summary.subjects[0];
        assert_eq!(physics.completed_chapters, 1);
        assert_eq!(physics.chapter_count, 2);
        assert_eq!(physics.categories[0], (Category::Learn, 100.0));
        assert_eq!(physics.categories[3], (Category::Revise, 50.0));
        assert_eq!(physics.chapters[1].progress, 20.0);
    }

    #[test]
    fn summary_follows_syllabus_order_with_unlisted_entries_last() {
        let syllabus = Syllabus::from_pairs(&[
            ("Physics", &["Units and Measurements", "Kinematics", "Atoms and Nuclei"][..]),
            ("Chemistry", &["Mole Concept"][..]),
        ]);
        let mut subjects = syllabus.template();
        subjects
            .get_mut("Physics")
            .unwrap()
            .insert("Extra Problems".into(), ChapterRecord::default());
        subjects.insert("Biology".into(), subject_of(vec![ChapterRecord::default()]));

        let summary = summarize(&subjects, &syllabus);
        let names: Vec<&str> = summary.subjects.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Physics", "Chemistry", "Biology"]);

        let physics: Vec<&str> = summary.subjects[0]
            .chapters
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            physics,
            ["Units and Measurements", "Kinematics", "Atoms and Nuclei", "Extra Problems"]
        );
    }
}
