use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{GradeError, GradeResult};
use crate::scale::{GradeScale, LetterGrade};
use crate::{check_score, normalize_course, store, Student};

// GradeManager owns every student and handles persistence
#[derive(Debug, Clone, Default)]
pub struct GradeManager {
    students: BTreeMap<String, Student>,
    scale: GradeScale,
}

impl GradeManager {
    #[must_use]
    pub fn new(scale: GradeScale) -> Self {
        Self {
            students: BTreeMap::new(),
            scale,
        }
    }

    #[must_use]
    pub const fn scale(&self) -> &GradeScale {
        &self.scale
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.students.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.students.contains_key(id.trim())
    }

    // Students in identifier order
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    /// # Errors
    ///
    /// Returns [`GradeError::StudentNotFound`] if no student has this identifier.
    pub fn student(&self, id: &str) -> GradeResult<&Student> {
        let id = id.trim();
        self.students
            .get(id)
            .ok_or_else(|| GradeError::StudentNotFound(id.to_string()))
    }

    fn student_mut(&mut self, id: &str) -> GradeResult<&mut Student> {
        let id = id.trim();
        self.students
            .get_mut(id)
            .ok_or_else(|| GradeError::StudentNotFound(id.to_string()))
    }

    // -------------------
    // Student management
    // -------------------

    /// Add a student with no display name.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the identifier is empty or taken.
    pub fn add_student(&mut self, id: &str) -> GradeResult<()> {
        self.insert_student(Student::new(id.trim()))
    }

    /// Add a student with a display name.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the identifier is empty or taken.
    pub fn add_named_student(&mut self, id: &str, name: &str) -> GradeResult<()> {
        self.insert_student(Student::new(id.trim()).with_name(name))
    }

    fn insert_student(&mut self, student: Student) -> GradeResult<()> {
        if student.id.is_empty() {
            return Err(GradeError::EmptyIdentifier);
        }
        if self.students.contains_key(&student.id) {
            warn!(id = %student.id, "rejected duplicate student");
            return Err(GradeError::StudentExists(student.id));
        }
        debug!(id = %student.id, "added student");
        self.students.insert(student.id.clone(), student);
        Ok(())
    }

    /// Remove a student and return it.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::StudentNotFound`] if no student has this identifier.
    pub fn remove_student(&mut self, id: &str) -> GradeResult<Student> {
        let id = id.trim();
        let removed = self
            .students
            .remove(id)
            .ok_or_else(|| GradeError::StudentNotFound(id.to_string()))?;
        debug!(id, "removed student");
        Ok(removed)
    }

    // -------------------
    // Course operations
    // -------------------

    /// # Errors
    ///
    /// Fails if the student does not exist or is already enrolled in the course.
    pub fn enroll(&mut self, id: &str, course: &str) -> GradeResult<()> {
        self.student_mut(id)?.enroll(course)?;
        debug!(id = id.trim(), course = course.trim(), "enrolled student");
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the student does not exist or is not enrolled in the course.
    pub fn drop_course(&mut self, id: &str, course: &str) -> GradeResult<()> {
        self.student_mut(id)?.drop_course(course)?;
        debug!(id = id.trim(), course = course.trim(), "dropped course");
        Ok(())
    }

    /// Assign a letter grade. The letter is checked before anything else, so
    /// a bad letter never touches state.
    ///
    /// # Errors
    ///
    /// Fails on an unknown letter, an unknown student or a course the student
    /// is not enrolled in.
    pub fn assign_grade(&mut self, id: &str, course: &str, letter: &str) -> GradeResult<()> {
        let letter: LetterGrade = letter.parse()?;
        self.assign_letter(id, course, letter)
    }

    /// # Errors
    ///
    /// Fails on an unknown student or a course the student is not enrolled in.
    pub fn assign_letter(&mut self, id: &str, course: &str, letter: LetterGrade) -> GradeResult<()> {
        normalize_course(course)?;
        self.student_mut(id)?.course_mut(course)?.assign(letter);
        debug!(id = id.trim(), course = course.trim(), %letter, "assigned grade");
        Ok(())
    }

    /// Record a numeric score for a course.
    ///
    /// # Errors
    ///
    /// Fails on an invalid score, an unknown student or a course the student is
    /// not enrolled in.
    pub fn record_score(&mut self, id: &str, course: &str, score: f64) -> GradeResult<()> {
        check_score(score)?;
        normalize_course(course)?;
        self.student_mut(id)?.course_mut(course)?.record_score(score)?;
        debug!(id = id.trim(), course = course.trim(), score, "recorded score");
        Ok(())
    }

    // -------------------
    // Aggregation
    // -------------------

    /// Mean recorded score for one course.
    ///
    /// # Errors
    ///
    /// Fails on an unknown student or course.
    pub fn average_for_course(&self, id: &str, course: &str) -> GradeResult<Option<f64>> {
        Ok(self.student(id)?.course(course)?.average())
    }

    /// 4.0-scale value of one course.
    ///
    /// # Errors
    ///
    /// Fails on an unknown student or course.
    pub fn course_points(&self, id: &str, course: &str) -> GradeResult<Option<f64>> {
        Ok(self.student(id)?.course(course)?.points(&self.scale))
    }

    /// 4.0-scale GPA, `None` when no course is graded.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::StudentNotFound`] for an unknown student.
    pub fn overall_gpa(&self, id: &str) -> GradeResult<Option<f64>> {
        Ok(self.student(id)?.gpa(&self.scale))
    }

    // -------------------
    // Reporting
    // -------------------

    /// One student's courses, grades and GPA as text.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::StudentNotFound`] for an unknown student.
    pub fn report(&self, id: &str) -> GradeResult<String> {
        let student = self.student(id)?;
        let mut out = String::new();

        let _ = write!(out, "ID: {}", student.id);
        if let Some(name) = &student.name {
            let _ = write!(out, " | Name: {name}");
        }

        if student.courses.is_empty() {
            out.push_str("\n  (no courses)");
        }
        for course in student.courses.values() {
            let letter = course
                .letter(&self.scale)
                .map_or_else(|| "N/A".to_string(), |l| l.to_string());
            let _ = write!(
                out,
                "\n  - {}: grade={letter} | scores={} | avg={}",
                course.name,
                format_scores(&course.scores),
                format_optional(course.average()),
            );
        }

        let _ = write!(
            out,
            "\n  Overall GPA: {}",
            format_optional(student.gpa(&self.scale))
        );
        Ok(out)
    }

    #[must_use]
    pub fn report_all(&self) -> String {
        if self.students.is_empty() {
            return "(no students)".to_string();
        }
        self.students
            .keys()
            .filter_map(|id| self.report(id).ok())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    // -------------------
    // Persistence
    // -------------------

    /// Write every student to `path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = store::to_file(self.students.values());
        store::write(&path, &file).context("failed to save grade book")?;
        info!(path = %path.as_ref().display(), students = self.students.len(), "saved grade book");
        Ok(())
    }

    /// Replace every student with the contents of `path`.
    ///
    /// The file is fully parsed before anything is replaced, so a failed load
    /// leaves the current students untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an entry
    /// breaks a rule direct input would enforce.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = store::read(&path).context("failed to load grade book")?;
        let students = store::from_file(file).with_context(|| {
            format!(
                "failed to load grade book: invalid entry in {}",
                path.as_ref().display()
            )
        })?;
        self.students = students;
        info!(path = %path.as_ref().display(), students = self.students.len(), "loaded grade book");
        Ok(())
    }

    /// Load `path` into a fresh manager, or start empty when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open<P: AsRef<Path>>(path: P, scale: GradeScale) -> Result<Self> {
        let mut manager = Self::new(scale);
        if path.as_ref().exists() {
            manager.load(&path)?;
        } else {
            debug!(path = %path.as_ref().display(), "no data file yet, starting empty");
        }
        Ok(manager)
    }
}

// Two decimals, or N/A when undefined
#[must_use]
pub fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn format_scores(scores: &[f64]) -> String {
    let parts: Vec<String> = scores.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
