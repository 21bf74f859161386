use thiserror::Error;

/// Failures of grade book operations. The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("student identifier must not be empty")]
    EmptyIdentifier,
    #[error("course name must not be empty")]
    EmptyCourseName,
    #[error("student '{0}' already exists")]
    StudentExists(String),
    #[error("student '{0}' not found")]
    StudentNotFound(String),
    #[error("student '{student}' is already enrolled in '{course}'")]
    AlreadyEnrolled { student: String, course: String },
    #[error("student '{student}' is not enrolled in '{course}'")]
    NotEnrolled { student: String, course: String },
    #[error("invalid letter grade '{0}' (expected one of A, B, C, D, F)")]
    InvalidLetter(String),
    #[error("invalid score {0} (must be a finite, non-negative number)")]
    InvalidScore(f64),
    #[error("invalid grade scale: {0}")]
    InvalidScale(String),
}

pub type GradeResult<T> = std::result::Result<T, GradeError>;
