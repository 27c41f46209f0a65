//! Static syllabus definition used to seed the progress map.
//!
//! The core never mutates a syllabus; it only reads subject and chapter
//! names from it when building a fresh [`SubjectMap`].

use crate::progress::{ChapterRecord, SubjectMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusSubject {
    pub name: String,
    pub chapters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllabus {
    subjects: Vec<SyllabusSubject>,
}

impl Syllabus {
    pub fn new(subjects: Vec<SyllabusSubject>) -> Self {
        Self { subjects }
    }

    /// Builds a syllabus from `(subject, chapters)` pairs.
    pub fn from_pairs<S, C>(pairs: &[(S, &[C])]) -> Self
    where
        S: AsRef<str>,
        C: AsRef<str>,
    {
        let subjects = pairs
            .iter()
            .map(|(name, chapters)| SyllabusSubject {
                name: name.as_ref().to_string(),
                chapters: chapters.iter().map(|c| c.as_ref().to_string()).collect(),
            })
            .collect();
        Self { subjects }
    }

    pub fn subjects(&self) -> &[SyllabusSubject] {
        &self.subjects
    }

    pub fn chapter_count(&self) -> usize {
        self.subjects.iter().map(|s| s.chapters.len()).sum()
    }

    /// Fresh map with every chapter at the zero record.
    pub fn template(&self) -> SubjectMap {
        let mut map = SubjectMap::new();
        for subject in &self.subjects {
            let chapters = map.entry(subject.name.clone()).or_default();
            for chapter in &subject.chapters {
                chapters.insert(chapter.clone(), ChapterRecord::default());
            }
        }
        map
    }
}

impl Default for Syllabus {
    fn default() -> Self {
        Self::from_pairs(&[
            ("Physics", PHYSICS),
            ("Chemistry", CHEMISTRY),
            ("Mathematics", MATHEMATICS),
        ])
    }
}

const PHYSICS: &[&str] = &[
    "Units and Measurements",
    "Kinematics",
    "Laws of Motion",
    "Work, Energy and Power",
    "Rotational Motion",
    "Gravitation",
    "Properties of Solids and Liquids",
    "Thermodynamics",
    "Kinetic Theory of Gases",
    "Oscillations and Waves",
    "Electrostatics",
    "Current Electricity",
    "Magnetic Effects of Current and Magnetism",
    "Electromagnetic Induction and Alternating Currents",
    "Electromagnetic Waves",
    "Optics",
    "Dual Nature of Matter and Radiation",
    "Atoms and Nuclei",
    "Electronic Devices",
];

const CHEMISTRY: &[&str] = &[
    "Some Basic Concepts in Chemistry",
    "Atomic Structure",
    "Chemical Bonding and Molecular Structure",
    "Chemical Thermodynamics",
    "Solutions",
    "Equilibrium",
    "Redox Reactions and Electrochemistry",
    "Chemical Kinetics",
    "Classification of Elements and Periodicity",
    "p-Block Elements",
    "d- and f-Block Elements",
    "Coordination Compounds",
    "Purification and Characterisation of Organic Compounds",
    "Some Basic Principles of Organic Chemistry",
    "Hydrocarbons",
    "Organic Compounds Containing Halogens",
    "Organic Compounds Containing Oxygen",
    "Organic Compounds Containing Nitrogen",
    "Biomolecules",
];

const MATHEMATICS: &[&str] = &[
    "Sets, Relations and Functions",
    "Complex Numbers and Quadratic Equations",
    "Matrices and Determinants",
    "Permutations and Combinations",
    "Binomial Theorem",
    "Sequences and Series",
    "Limits, Continuity and Differentiability",
    "Integral Calculus",
    "Differential Equations",
    "Coordinate Geometry",
    "Three Dimensional Geometry",
    "Vector Algebra",
    "Statistics and Probability",
    "Trigonometry",
];
