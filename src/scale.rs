use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GradeError, GradeResult};

// Letter grade as stored in the data file
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    pub const ALL: [Self; 5] = [Self::A, Self::B, Self::C, Self::D, Self::F];

    /// Grade points on the 4.0 scale.
    #[must_use]
    pub const fn points(self) -> f64 {
        match self {
            Self::A => 4.0,
            Self::B => 3.0,
            Self::C => 2.0,
            Self::D => 1.0,
            Self::F => 0.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LetterGrade {
    type Err = GradeError;

    fn from_str(s: &str) -> GradeResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "F" => Ok(Self::F),
            _ => Err(GradeError::InvalidLetter(s.trim().to_string())),
        }
    }
}

/// Score cut-offs for converting a numeric score into a letter.
///
/// A score at or above `a` is an A, at or above `b` a B, and so on; anything
/// below `d` is an F.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct GradeScale {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            a: 90.0,
            b: 80.0,
            c: 70.0,
            d: 60.0,
        }
    }
}

impl GradeScale {
    /// Check that every cut-off is finite and that they strictly descend.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::InvalidScale`] describing the first problem found.
    pub fn validate(&self) -> GradeResult<()> {
        let cutoffs = [("a", self.a), ("b", self.b), ("c", self.c), ("d", self.d)];

        if let Some((name, value)) = cutoffs.iter().find(|(_, v)| !v.is_finite()) {
            return Err(GradeError::InvalidScale(format!(
                "cut-off '{name}' is not a finite number ({value})"
            )));
        }

        for pair in cutoffs.windows(2) {
            let (upper, upper_value) = pair[0];
            let (lower, lower_value) = pair[1];
            if upper_value <= lower_value {
                return Err(GradeError::InvalidScale(format!(
                    "cut-off '{upper}' ({upper_value}) must be above '{lower}' ({lower_value})"
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn letter_for(&self, score: f64) -> LetterGrade {
        if score >= self.a {
            LetterGrade::A
        } else if score >= self.b {
            LetterGrade::B
        } else if score >= self.c {
            LetterGrade::C
        } else if score >= self.d {
            LetterGrade::D
        } else {
            LetterGrade::F
        }
    }

    #[must_use]
    pub fn points_for(&self, score: f64) -> f64 {
        self.letter_for(score).points()
    }
}
