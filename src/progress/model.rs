use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chapter name -> record, for one subject.
pub type ChapterMap = BTreeMap<String, ChapterRecord>;

/// Subject name -> chapters. Keys come from the syllabus and never change at runtime.
pub type SubjectMap = BTreeMap<String, ChapterMap>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ChapterTag {
    #[default]
    #[serde(rename = "")]
    None,
    Weak,
    Medium,
    Strong,
}

impl ChapterTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterTag::None => "",
            ChapterTag::Weak => "Weak",
            ChapterTag::Medium => "Medium",
            ChapterTag::Strong => "Strong",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Learn,
    Practice,
    Tests,
    Revise,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Learn,
        Category::Practice,
        Category::Tests,
        Category::Revise,
    ];

    /// The fixed set of completion fields that make up this category.
    pub fn fields(&self) -> &'static [CompletionField] {
        use CompletionField::*;
        match self {
            Category::Learn => &[Notes, ShortNotes],
            Category::Practice => &[Modules, Ncert],
            Category::Tests => &[PyqMains, PyqAdv, TestMains, TestAdv],
            Category::Revise => &[RevisedMains, RevisedAdv],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Learn => "learn",
            Category::Practice => "practice",
            Category::Tests => "tests",
            Category::Revise => "revise",
        }
    }
}

/// One of the ten boolean completion fields on a chapter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CompletionField {
    Notes,
    ShortNotes,
    Modules,
    Ncert,
    PyqMains,
    PyqAdv,
    TestMains,
    TestAdv,
    RevisedMains,
    RevisedAdv,
}

impl CompletionField {
    pub const ALL: [CompletionField; 10] = [
        CompletionField::Notes,
        CompletionField::ShortNotes,
        CompletionField::Modules,
        CompletionField::Ncert,
        CompletionField::PyqMains,
        CompletionField::PyqAdv,
        CompletionField::TestMains,
        CompletionField::TestAdv,
        CompletionField::RevisedMains,
        CompletionField::RevisedAdv,
    ];

    pub fn category(&self) -> Category {
        use CompletionField::*;
        match self {
            Notes | ShortNotes => Category::Learn,
            Modules | Ncert => Category::Practice,
            PyqMains | PyqAdv | TestMains | TestAdv => Category::Tests,
            RevisedMains | RevisedAdv => Category::Revise,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterRecord {
    pub notes: bool,
    pub short_notes: bool,
    pub modules: bool,
    pub ncert: bool,
    pub pyq_mains: bool,
    pub pyq_adv: bool,
    pub test_mains: bool,
    pub test_adv: bool,
    pub revised_mains: bool,
    pub revised_adv: bool,
    pub tag: ChapterTag,
    pub remarks: String,
}

impl ChapterRecord {
    pub fn get(&self, field: CompletionField) -> bool {
        match field {
            CompletionField::Notes => self.notes,
            CompletionField::ShortNotes => self.short_notes,
            CompletionField::Modules => self.modules,
            CompletionField::Ncert => self.ncert,
            CompletionField::PyqMains => self.pyq_mains,
            CompletionField::PyqAdv => self.pyq_adv,
            CompletionField::TestMains => self.test_mains,
            CompletionField::TestAdv => self.test_adv,
            CompletionField::RevisedMains => self.revised_mains,
            CompletionField::RevisedAdv => self.revised_adv,
        }
    }

    pub fn set(&mut self, field: CompletionField, value: bool) {
        let slot = match field {
            CompletionField::Notes => &mut self.notes,
            CompletionField::ShortNotes => &mut self.short_notes,
            CompletionField::Modules => &mut self.modules,
            CompletionField::Ncert => &mut self.ncert,
            CompletionField::PyqMains => &mut self.pyq_mains,
            CompletionField::PyqAdv => &mut self.pyq_adv,
            CompletionField::TestMains => &mut self.test_mains,
            CompletionField::TestAdv => &mut self.test_adv,
            CompletionField::RevisedMains => &mut self.revised_mains,
            CompletionField::RevisedAdv => &mut self.revised_adv,
        };
        *slot = value;
    }

    pub fn completed_count(&self) -> usize {
        CompletionField::ALL
            .iter()
            .filter(|field| self.get(**field))
            .count()
    }

    /// All ten completion fields set; tag and remarks are not considered.
    pub fn is_complete(&self) -> bool {
        self.completed_count() == CompletionField::ALL.len()
    }

    pub fn mark_all(&mut self, value: bool) {
        for field in CompletionField::ALL {
            self.set(field, value);
        }
    }
}

/// Describes which named fields of a [`ChapterRecord`] change.
///
/// Fields left as `None` are untouched when the update is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterUpdate {
    pub notes: Option<bool>,
    pub short_notes: Option<bool>,
    pub modules: Option<bool>,
    pub ncert: Option<bool>,
    pub pyq_mains: Option<bool>,
    pub pyq_adv: Option<bool>,
    pub test_mains: Option<bool>,
    pub test_adv: Option<bool>,
    pub revised_mains: Option<bool>,
    pub revised_adv: Option<bool>,
    pub tag: Option<ChapterTag>,
    pub remarks: Option<String>,
}

impl ChapterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: CompletionField, value: bool) -> Self {
        let slot = match field {
            CompletionField::Notes => &mut self.notes,
            CompletionField::ShortNotes => &mut self.short_notes,
            CompletionField::Modules => &mut self.modules,
            CompletionField::Ncert => &mut self.ncert,
            CompletionField::PyqMains => &mut self.pyq_mains,
            CompletionField::PyqAdv => &mut self.pyq_adv,
            CompletionField::TestMains => &mut self.test_mains,
            CompletionField::TestAdv => &mut self.test_adv,
            CompletionField::RevisedMains => &mut self.revised_mains,
            CompletionField::RevisedAdv => &mut self.revised_adv,
        };
        *slot = Some(value);
        self
    }

    pub fn tag(mut self, tag: ChapterTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, record: &mut ChapterRecord) {
        let flags = [
            (CompletionField::Notes, self.notes),
            (CompletionField::ShortNotes, self.short_notes),
            (CompletionField::Modules, self.modules),
            (CompletionField::Ncert, self.ncert),
            (CompletionField::PyqMains, self.pyq_mains),
            (CompletionField::PyqAdv, self.pyq_adv),
            (CompletionField::TestMains, self.test_mains),
            (CompletionField::TestAdv, self.test_adv),
            (CompletionField::RevisedMains, self.revised_mains),
            (CompletionField::RevisedAdv, self.revised_adv),
        ];
        for (field, value) in flags {
            if let Some(value) = value {
                record.set(field, value);
            }
        }
        if let Some(tag) = self.tag {
            record.tag = tag;
        }
        if let Some(remarks) = &self.remarks {
            record.remarks = remarks.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct WeakChapter {
    pub subject: String,
    pub chapter: String,
}

impl WeakChapter {
    pub fn new(subject: impl Into<String>, chapter: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            chapter: chapter.into(),
        }
    }
}
