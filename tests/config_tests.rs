//! Configuration loading and precedence

use grade_tracker::{GradeScale, TrackerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = TrackerConfig::default();
    assert_eq!(config.data_file, PathBuf::from("students.json"));
    assert_eq!(config.scale, GradeScale::default());
}

#[test]
fn test_config_from_toml_partial() {
    let toml_str = r#"
data_file = "grades/fall.json"

[scale]
a = 93.0
"#;

    let config = TrackerConfig::from_toml(toml_str).expect("Failed to parse TOML");
    assert_eq!(config.data_file, PathBuf::from("grades/fall.json"));
    assert_eq!(config.scale.a, 93.0);
    // Unset cut-offs keep their defaults
    assert_eq!(config.scale.b, 80.0);
    assert_eq!(config.scale.d, 60.0);
}

#[test]
fn test_config_from_toml_invalid() {
    assert!(TrackerConfig::from_toml("data_file = [").is_err());
    assert!(TrackerConfig::from_toml("[scale]\na = \"high\"").is_err());
}

#[test]
fn test_explicit_config_must_exist() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("missing.toml");
    assert!(TrackerConfig::load(Some(&missing)).is_err());
}

#[test]
fn test_cli_flag_overrides_file() {
    let mut config = TrackerConfig::default();
    config.apply_cli(Some(Path::new("override.json")));
    assert_eq!(config.data_file, PathBuf::from("override.json"));

    config.apply_cli(None);
    assert_eq!(config.data_file, PathBuf::from("override.json"));
}

// Environment handling lives in one test so no other test observes the variables
#[test]
fn test_load_file_then_env_then_cli() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_file = temp_dir.path().join("grade-tracker.toml");
    fs::write(
        &config_file,
        "data_file = \"from-file.json\"\n[scale]\nb = 82.0\n",
    )
    .expect("Failed to write config");

    let config = TrackerConfig::load(Some(&config_file)).expect("Failed to load config");
    assert_eq!(config.data_file, PathBuf::from("from-file.json"));
    assert_eq!(config.scale.b, 82.0);

    std::env::set_var("GRADE_TRACKER_DATA_FILE", "from-env.json");
    std::env::set_var("GRADE_TRACKER_CUTOFF_C", "72.5");
    std::env::set_var("GRADE_TRACKER_CUTOFF_D", "not a number");
    let mut config = TrackerConfig::load(Some(&config_file)).expect("Failed to load config");
    assert_eq!(config.data_file, PathBuf::from("from-env.json"));
    assert_eq!(config.scale.c, 72.5);
    assert_eq!(config.scale.d, 60.0);

    config.apply_cli(Some(Path::new("from-cli.json")));
    assert_eq!(config.data_file, PathBuf::from("from-cli.json"));

    // An env override that breaks the ordering is rejected
    std::env::set_var("GRADE_TRACKER_CUTOFF_C", "99");
    assert!(TrackerConfig::load(Some(&config_file)).is_err());

    std::env::remove_var("GRADE_TRACKER_DATA_FILE");
    std::env::remove_var("GRADE_TRACKER_CUTOFF_C");
    std::env::remove_var("GRADE_TRACKER_CUTOFF_D");
}
