//! On-disk JSON layout of the grade book.
//!
//! The file is an object keyed by student identifier:
//!
//! ```json
//! {
//!   "s001": {
//!     "name": "Ada",
//!     "courses": {
//!       "Algebra": "A",
//!       "History": null,
//!       "Physics": { "grade": null, "scores": [88.0, 93.5] }
//!     }
//!   }
//! }
//! ```
//!
//! A course without recorded scores is written as its bare letter (or `null`).
//! Reading also accepts a bare list of scores, and a file wrapped in a
//! top-level `"students"` object as older versions wrote it. Unknown fields are
//! rejected, and every entry is checked the same way the grade book checks
//! direct input: identifiers and course names are trimmed and must be non-empty
//! and unique, and scores must be finite and non-negative.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{GradeError, GradeResult};
use crate::{Course, LetterGrade, Student};

// Whole-file format: student id -> record
pub type StudentFile = BTreeMap<String, StoredStudent>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StoredStudent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub courses: BTreeMap<String, StoredCourse>,
}

// Accepted shapes for a single course entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StoredCourse {
    Letter(Option<LetterGrade>),
    Scores(Vec<f64>),
    Full(CourseRecord),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CourseRecord {
    #[serde(default)]
    pub grade: Option<LetterGrade>,
    #[serde(default)]
    pub scores: Vec<f64>,
}

impl From<&Course> for StoredCourse {
    fn from(course: &Course) -> Self {
        if course.scores.is_empty() {
            Self::Letter(course.grade)
        } else {
            Self::Full(CourseRecord {
                grade: course.grade,
                scores: course.scores.clone(),
            })
        }
    }
}

impl StoredCourse {
    fn apply_to(self, course: &mut Course) -> GradeResult<()> {
        let (grade, scores) = match self {
            Self::Letter(grade) => (grade, Vec::new()),
            Self::Scores(scores) => (None, scores),
            Self::Full(record) => (record.grade, record.scores),
        };
        if let Some(letter) = grade {
            course.assign(letter);
        }
        for score in scores {
            course.record_score(score)?;
        }
        Ok(())
    }
}

impl From<&Student> for StoredStudent {
    fn from(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            courses: student
                .courses
                .iter()
                .map(|(name, course)| (name.clone(), StoredCourse::from(course)))
                .collect(),
        }
    }
}

impl StoredStudent {
    /// Rebuild a student, applying the same checks as direct input.
    ///
    /// # Errors
    ///
    /// Fails on an empty identifier, an empty or repeated course name after
    /// trimming, or an invalid score.
    pub fn into_student(self, id: &str) -> GradeResult<Student> {
        let id = id.trim();
        if id.is_empty() {
            return Err(GradeError::EmptyIdentifier);
        }

        let mut student = Student::new(id);
        if let Some(name) = self.name {
            student = student.with_name(name);
        }
        for (name, stored) in self.courses {
            student.enroll(&name)?;
            stored.apply_to(student.course_mut(&name)?)?;
        }
        Ok(student)
    }
}

/// Build the file representation of a student collection.
#[must_use]
pub fn to_file<'a>(students: impl IntoIterator<Item = &'a Student>) -> StudentFile {
    students
        .into_iter()
        .map(|student| (student.id.clone(), StoredStudent::from(student)))
        .collect()
}

/// Rebuild students from the file representation.
///
/// # Errors
///
/// Fails on the first entry that direct input would reject, including two
/// identifiers that are equal after trimming.
pub fn from_file(file: StudentFile) -> GradeResult<BTreeMap<String, Student>> {
    let mut students = BTreeMap::new();
    for (key, stored) in file {
        let student = stored.into_student(&key)?;
        if students.contains_key(&student.id) {
            return Err(GradeError::StudentExists(student.id));
        }
        students.insert(student.id.clone(), student);
    }
    Ok(students)
}

// Inner object of a `{"students": {...}}` file, if that is the layout
fn students_wrapper(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get("students").filter(|inner| inner.is_object())
}

/// Parse a student file from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a valid student file.
pub fn parse(content: &str) -> Result<StudentFile> {
    let value: Value = serde_json::from_str(content).context("invalid JSON")?;

    if let Some(inner) = students_wrapper(&value) {
        if let Ok(file) = StudentFile::deserialize(inner) {
            debug!("reading student data from a \"students\" wrapper");
            return Ok(file);
        }
    }

    StudentFile::deserialize(value).context("unrecognized student data layout")
}

/// Read and parse a student file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid student file.
pub fn read<P: AsRef<Path>>(path: P) -> Result<StudentFile> {
    let path_str = path.as_ref().to_string_lossy();
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read student data from {path_str}"))?;

    parse(&content).with_context(|| format!("failed to parse JSON from {path_str}"))
}

/// Serialize and write a student file, replacing any previous content.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn write<P: AsRef<Path>>(path: P, file: &StudentFile) -> Result<()> {
    let path_str = path.as_ref().to_string_lossy();
    let content =
        serde_json::to_string_pretty(file).context("failed to serialize student data to JSON")?;

    fs::write(&path, content)
        .with_context(|| format!("failed to write student data to {path_str}"))
}
