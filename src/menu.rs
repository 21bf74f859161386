use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use grade_tracker::grade_manager::format_optional;
use grade_tracker::{GradeError, GradeManager, LetterGrade};

const MENU: &str = "\
======== Student Grade Tracker ========
1. Add student
2. Remove student
3. Enroll student in a course
4. Remove a course from a student
5. Assign letter grade
6. Record numeric score
7. Display student info
8. Display all students
9. Save data
10. Load data
11. Exit";

enum Flow {
    Continue,
    Exit,
}

// Interactive session over any line-based input and output
pub struct Menu<'a, R, W> {
    manager: &'a mut GradeManager,
    default_path: PathBuf,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(manager: &'a mut GradeManager, default_path: &Path, input: R, output: W) -> Self {
        Self {
            manager,
            default_path: default_path.to_path_buf(),
            input,
            output,
        }
    }

    // Run until the user exits or input ends. Nothing is saved on exit.
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "\n{MENU}")?;
            let Some(choice) = self.prompt("Select an option (1-11): ")? else {
                break;
            };

            match self.dispatch(&choice) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => {
                    warn!("menu action failed: {e:#}");
                    writeln!(self.output, "Error: {e:#}")?;
                }
            }
        }
        writeln!(self.output, "Exiting...")?;
        Ok(())
    }

    fn dispatch(&mut self, choice: &str) -> Result<Flow> {
        match choice {
            "1" => self.add_student()?,
            "2" => {
                let Some(id) = self.prompt("Enter student ID: ")? else {
                    return Ok(Flow::Exit);
                };
                self.manager.remove_student(&id)?;
                writeln!(self.output, "Student {id} removed.")?;
            }
            "3" => {
                let Some((id, course)) = self.prompt_student_and_course(false)? else {
                    return Ok(Flow::Exit);
                };
                self.manager.enroll(&id, &course)?;
                writeln!(self.output, "Student {id} enrolled in {course}.")?;
            }
            "4" => {
                let Some((id, course)) = self.prompt_student_and_course(true)? else {
                    return Ok(Flow::Exit);
                };
                self.manager.drop_course(&id, &course)?;
                writeln!(self.output, "Course {course} removed from student {id}.")?;
            }
            "5" => self.assign_grade()?,
            "6" => self.record_score()?,
            "7" => {
                let Some(id) = self.prompt("Enter student ID: ")? else {
                    return Ok(Flow::Exit);
                };
                writeln!(self.output, "{}", self.manager.report(&id)?)?;
            }
            "8" => writeln!(self.output, "{}", self.manager.report_all())?,
            "9" => {
                let path = self.prompt_path("save")?;
                self.manager.save(&path)?;
                writeln!(self.output, "Data saved to '{}'.", path.display())?;
            }
            "10" => {
                let path = self.prompt_path("load")?;
                self.manager.load(&path)?;
                writeln!(self.output, "Data loaded from '{}'.", path.display())?;
            }
            "11" => return Ok(Flow::Exit),
            _ => writeln!(self.output, "Invalid choice. Please select 1-11.")?,
        }
        Ok(Flow::Continue)
    }

    fn add_student(&mut self) -> Result<()> {
        let Some(id) = self.prompt("Enter student ID: ")? else {
            return Ok(());
        };
        if self.manager.contains(&id) {
            return Err(GradeError::StudentExists(id).into());
        }
        let name = self.prompt("Enter student name (optional): ")?.unwrap_or_default();
        self.manager.add_named_student(&id, &name)?;
        writeln!(self.output, "Student {id} added.")?;
        Ok(())
    }

    fn assign_grade(&mut self) -> Result<()> {
        let Some((id, course)) = self.prompt_student_and_course(true)? else {
            return Ok(());
        };
        loop {
            let Some(raw) = self.prompt("Enter letter grade (A, B, C, D, F): ")? else {
                return Ok(());
            };
            match raw.parse::<LetterGrade>() {
                Ok(letter) => {
                    self.manager.assign_letter(&id, &course, letter)?;
                    writeln!(self.output, "Grade {letter} assigned for {id} in {course}.")?;
                    return Ok(());
                }
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    fn record_score(&mut self) -> Result<()> {
        let Some((id, course)) = self.prompt_student_and_course(true)? else {
            return Ok(());
        };
        loop {
            let Some(raw) = self.prompt("Enter score (numeric): ")? else {
                return Ok(());
            };
            let Ok(score) = raw.parse::<f64>() else {
                writeln!(self.output, "Please enter a valid number.")?;
                continue;
            };
            match self.manager.record_score(&id, &course, score) {
                Ok(()) => {
                    let avg = self.manager.average_for_course(&id, &course)?;
                    writeln!(
                        self.output,
                        "Score recorded. {course} average now: {}",
                        format_optional(avg)
                    )?;
                    return Ok(());
                }
                Err(GradeError::InvalidScore(_)) => {
                    writeln!(self.output, "Please enter a non-negative number.")?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // Ask for a student, checking it exists before asking for the course.
    // With `enrolled`, the course must already be on the student's list.
    fn prompt_student_and_course(&mut self, enrolled: bool) -> Result<Option<(String, String)>> {
        let Some(id) = self.prompt("Enter student ID: ")? else {
            return Ok(None);
        };
        self.manager.student(&id)?;

        let Some(course) = self.prompt("Enter course name: ")? else {
            return Ok(None);
        };
        if enrolled {
            self.manager.student(&id)?.course(&course)?;
        }
        Ok(Some((id, course)))
    }

    fn prompt_path(&mut self, action: &str) -> Result<PathBuf> {
        let default = self.default_path.display().to_string();
        let answer = self
            .prompt(&format!("Enter filename to {action} [{default}]: "))?
            .unwrap_or_default();
        if answer.is_empty() {
            Ok(self.default_path.clone())
        } else {
            Ok(PathBuf::from(answer))
        }
    }

    // Prompt and read one trimmed line; None at end of input
    fn prompt(&mut self, msg: &str) -> Result<Option<String>> {
        write!(self.output, "{msg}")?;
        self.output.flush().context("failed to flush output")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run_script(manager: &mut GradeManager, default_path: &Path, script: &str) -> String {
        let mut output = Vec::new();
        Menu::new(manager, default_path, Cursor::new(script.to_string()), &mut output)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_menu_add_enroll_assign() {
        let mut manager = GradeManager::default();
        let script = "1\ns1\nAda\n3\ns1\nMath\n5\ns1\nMath\nz\nb\n11\n";
        let out = run_script(&mut manager, Path::new("unused.json"), script);

        assert!(out.contains("Student s1 added."));
        assert!(out.contains("Student s1 enrolled in Math."));
        assert!(out.contains("invalid letter grade 'z'"));
        assert!(out.contains("Grade B assigned for s1 in Math."));
        assert_eq!(manager.overall_gpa("s1").unwrap(), Some(3.0));
    }

    #[test]
    fn test_menu_reports_errors_and_continues() {
        let mut manager = GradeManager::default();
        let script = "2\nghost\n42\n8\n11\n";
        let out = run_script(&mut manager, Path::new("unused.json"), script);

        assert!(out.contains("Error: student 'ghost' not found"));
        assert!(out.contains("Invalid choice. Please select 1-11."));
        assert!(out.contains("(no students)"));
        assert!(out.ends_with("Exiting...\n"));
    }

    #[test]
    fn test_menu_unknown_student_stops_before_course_prompt() {
        let mut manager = GradeManager::default();
        let script = "6\nghost\n11\n";
        let out = run_script(&mut manager, Path::new("unused.json"), script);

        assert!(out.contains("Error: student 'ghost' not found"));
        assert!(!out.contains("Enter course name"));
    }

    #[test]
    fn test_menu_score_retries_until_valid() {
        let mut manager = GradeManager::default();
        manager.add_student("s1").unwrap();
        manager.enroll("s1", "Art").unwrap();

        let script = "6\ns1\nArt\nabc\n-5\n85\n11\n";
        let out = run_script(&mut manager, Path::new("unused.json"), script);

        assert!(out.contains("Please enter a valid number."));
        assert!(out.contains("Please enter a non-negative number."));
        assert!(out.contains("Art average now: 85.00"));
    }

    #[test]
    fn test_menu_save_uses_default_path_and_does_not_save_on_exit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("students.json");
        let mut manager = GradeManager::default();

        let out = run_script(&mut manager, &path, "1\ns1\n\n11\n");
        assert!(out.contains("Student s1 added."));
        assert!(!path.exists());

        run_script(&mut manager, &path, "9\n\n11\n");
        assert!(path.exists());

        let mut reloaded = GradeManager::default();
        run_script(&mut reloaded, &path, "10\n\n11\n");
        assert!(reloaded.contains("s1"));
    }

    #[test]
    fn test_menu_exits_at_end_of_input() {
        let mut manager = GradeManager::default();
        let out = run_script(&mut manager, Path::new("unused.json"), "8\n");
        assert!(out.ends_with("Exiting...\n"));
    }
}
