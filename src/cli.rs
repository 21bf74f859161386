use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::menu::Menu;
use grade_tracker::grade_manager::format_optional;
use grade_tracker::{GradeManager, LetterGrade, Student, TrackerConfig};

// CLI arguments parsing structure
#[derive(Parser)]
#[command(author, version, about, long_about = None, disable_help_subcommand = true)]
pub struct Cli {
    /// Output reports in JSON format
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Student data file (overrides config and GRADE_TRACKER_DATA_FILE)
    #[arg(short = 'd', long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Config file (defaults to ./grade-tracker.toml when present)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a student
    Add {
        /// Unique student identifier
        id: String,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Remove a student
    Remove { id: String },
    /// Enroll a student in a course
    Enroll { id: String, course: String },
    /// Remove a course from a student
    Drop { id: String, course: String },
    /// Assign a letter grade (A, B, C, D, F) for a course
    Assign {
        id: String,
        course: String,
        letter: String,
    },
    /// Record a numeric score for a course
    Score {
        id: String,
        course: String,
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
    /// Show one student, or every student when no ID is given
    Report { id: Option<String> },
    /// Start the interactive menu (default)
    Menu,
}

// JSON shape of a report
#[derive(Serialize)]
struct StudentSummary<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    courses: Vec<CourseSummary<'a>>,
    gpa: Option<f64>,
}

#[derive(Serialize)]
struct CourseSummary<'a> {
    name: &'a str,
    grade: Option<String>,
    scores: &'a [f64],
    average: Option<f64>,
    points: Option<f64>,
}

// Execute the selected command
pub fn execute_command(cli: &Cli) -> Result<()> {
    let mut config =
        TrackerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_cli(cli.data_file.as_deref());

    match &cli.command {
        None | Some(Commands::Menu) => cmd_menu(&config),
        Some(Commands::Report { id }) => cmd_report(&config, id.as_deref(), cli.json),
        Some(Commands::Add { id, name }) => cmd_mutate(&config, |manager| {
            match name {
                Some(name) => manager.add_named_student(id, name)?,
                None => manager.add_student(id)?,
            }
            Ok(format!("student {id} added"))
        }),
        Some(Commands::Remove { id }) => cmd_mutate(&config, |manager| {
            manager.remove_student(id)?;
            Ok(format!("student {id} removed"))
        }),
        Some(Commands::Enroll { id, course }) => cmd_mutate(&config, |manager| {
            manager.enroll(id, course)?;
            Ok(format!("student {id} enrolled in {course}"))
        }),
        Some(Commands::Drop { id, course }) => cmd_mutate(&config, |manager| {
            manager.drop_course(id, course)?;
            Ok(format!("course {course} removed from student {id}"))
        }),
        Some(Commands::Assign { id, course, letter }) => cmd_mutate(&config, |manager| {
            let letter: LetterGrade = letter.parse()?;
            manager.assign_letter(id, course, letter)?;
            Ok(format!("grade {letter} assigned for {id} in {course}"))
        }),
        Some(Commands::Score { id, course, score }) => cmd_mutate(&config, |manager| {
            manager.record_score(id, course, *score)?;
            let avg = manager.average_for_course(id, course)?;
            Ok(format!(
                "score recorded, {course} average now {}",
                format_optional(avg)
            ))
        }),
    }
}

fn open_manager(config: &TrackerConfig) -> Result<GradeManager> {
    GradeManager::open(&config.data_file, config.scale).with_context(|| {
        format!(
            "failed to open student data at {}",
            config.data_file.display()
        )
    })
}

fn cmd_menu(config: &TrackerConfig) -> Result<()> {
    // The menu starts empty; data is only read when the user asks to load
    let mut manager = GradeManager::new(config.scale);
    let stdin = io::stdin();
    Menu::new(&mut manager, &config.data_file, stdin.lock(), io::stdout()).run()
}

// One-shot commands: load, apply, save, then report what changed
fn cmd_mutate<F>(config: &TrackerConfig, action: F) -> Result<()>
where
    F: FnOnce(&mut GradeManager) -> Result<String>,
{
    let mut manager = open_manager(config)?;
    let message = action(&mut manager)?;
    save_manager(&manager, &config.data_file)?;
    println!("{message}");
    Ok(())
}

fn save_manager(manager: &GradeManager, path: &Path) -> Result<()> {
    manager
        .save(path)
        .with_context(|| format!("failed to save student data to {}", path.display()))
}

fn cmd_report(config: &TrackerConfig, id: Option<&str>, json_output: bool) -> Result<()> {
    let manager = open_manager(config)?;
    println!("{}", render_report(&manager, id, json_output)?);
    Ok(())
}

// Text report, or JSON summaries with `json_output`
fn render_report(manager: &GradeManager, id: Option<&str>, json_output: bool) -> Result<String> {
    if !json_output {
        return match id {
            Some(id) => Ok(manager.report(id)?),
            None => Ok(manager.report_all()),
        };
    }

    let students: Vec<&Student> = match id {
        Some(id) => vec![manager.student(id)?],
        None => manager.students().collect(),
    };
    let summaries: Vec<StudentSummary> = students
        .into_iter()
        .map(|student| summarize(manager, student))
        .collect();
    serde_json::to_string_pretty(&summaries).context("failed to serialize report to JSON")
}

fn summarize<'a>(manager: &GradeManager, student: &'a Student) -> StudentSummary<'a> {
    let scale = manager.scale();
    StudentSummary {
        id: &student.id,
        name: student.name.as_deref(),
        courses: student
            .courses
            .values()
            .map(|course| CourseSummary {
                name: &course.name,
                grade: course.letter(scale).map(|l| l.to_string()),
                scores: &course.scores,
                average: course.average(),
                points: course.points(scale),
            })
            .collect(),
        gpa: student.gpa(scale),
    }
}
