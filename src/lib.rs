use std::collections::BTreeMap;

pub mod config;
pub mod error;
pub mod grade_manager;
pub mod scale;
pub mod store;

pub use config::TrackerConfig;
pub use error::{GradeError, GradeResult};
pub use grade_manager::GradeManager;
pub use scale::{GradeScale, LetterGrade};

// A course a student is enrolled in, with its letter grade and raw scores
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Course {
    pub name: String,
    pub grade: Option<LetterGrade>,
    pub scores: Vec<f64>,
}

impl Course {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grade: None,
            scores: Vec::new(),
        }
    }

    /// Append a numeric score.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::InvalidScore`] if the score is negative or not finite.
    pub fn record_score(&mut self, score: f64) -> GradeResult<()> {
        check_score(score)?;
        self.scores.push(score);
        Ok(())
    }

    // Assign (or overwrite) the letter grade
    pub fn assign(&mut self, letter: LetterGrade) {
        self.grade = Some(letter);
    }

    /// Mean of the recorded scores, `None` when nothing has been recorded.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
    }

    /// The letter that counts toward the GPA: an assigned letter wins over one
    /// derived from the score average.
    #[must_use]
    pub fn letter(&self, scale: &GradeScale) -> Option<LetterGrade> {
        self.grade.or_else(|| self.average().map(|avg| scale.letter_for(avg)))
    }

    #[must_use]
    pub fn points(&self, scale: &GradeScale) -> Option<f64> {
        self.letter(scale).map(LetterGrade::points)
    }
}

// A student keyed by a unique identifier, with an optional display name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Student {
    pub id: String,
    pub name: Option<String>,
    pub courses: BTreeMap<String, Course>,
}

impl Student {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            courses: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            None
        } else {
            Some(name.trim().to_string())
        };
        self
    }

    /// Enroll the student in a course with no grade yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the course name is empty or the student is already enrolled.
    pub fn enroll(&mut self, course_name: &str) -> GradeResult<()> {
        let course_name = normalize_course(course_name)?;
        if self.courses.contains_key(course_name) {
            return Err(GradeError::AlreadyEnrolled {
                student: self.id.clone(),
                course: course_name.to_string(),
            });
        }
        self.courses.insert(course_name.to_string(), Course::new(course_name));
        Ok(())
    }

    /// Remove a course, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::NotEnrolled`] if the student does not take the course.
    pub fn drop_course(&mut self, course_name: &str) -> GradeResult<Course> {
        let course_name = course_name.trim();
        self.courses
            .remove(course_name)
            .ok_or_else(|| self.not_enrolled(course_name))
    }

    /// # Errors
    ///
    /// Returns [`GradeError::NotEnrolled`] if the student does not take the course.
    pub fn course(&self, course_name: &str) -> GradeResult<&Course> {
        let course_name = course_name.trim();
        self.courses
            .get(course_name)
            .ok_or_else(|| self.not_enrolled(course_name))
    }

    /// # Errors
    ///
    /// Returns [`GradeError::NotEnrolled`] if the student does not take the course.
    pub fn course_mut(&mut self, course_name: &str) -> GradeResult<&mut Course> {
        let course_name = course_name.trim();
        let student = &self.id;
        self.courses
            .get_mut(course_name)
            .ok_or_else(|| GradeError::NotEnrolled {
                student: student.clone(),
                course: course_name.to_string(),
            })
    }

    /// Overall GPA on the 4.0 scale, averaged over courses that have a grade.
    ///
    /// Undefined (`None`) when no course has a grade yet.
    #[must_use]
    pub fn gpa(&self, scale: &GradeScale) -> Option<f64> {
        let points: Vec<f64> = self
            .courses
            .values()
            .filter_map(|course| course.points(scale))
            .collect();

        if points.is_empty() {
            return None;
        }
        Some(points.iter().sum::<f64>() / points.len() as f64)
    }

    fn not_enrolled(&self, course_name: &str) -> GradeError {
        GradeError::NotEnrolled {
            student: self.id.clone(),
            course: course_name.to_string(),
        }
    }
}

/// Reject scores that cannot be averaged meaningfully.
///
/// # Errors
///
/// Returns [`GradeError::InvalidScore`] for negative, NaN or infinite values.
pub fn check_score(score: f64) -> GradeResult<()> {
    if score.is_finite() && score >= 0.0 {
        Ok(())
    } else {
        Err(GradeError::InvalidScore(score))
    }
}

pub(crate) fn normalize_course(course_name: &str) -> GradeResult<&str> {
    let trimmed = course_name.trim();
    if trimmed.is_empty() {
        return Err(GradeError::EmptyCourseName);
    }
    Ok(trimmed)
}
