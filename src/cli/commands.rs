//! CLI command implementations
//!
//! `check` runs one load cycle:
//! 1. Configuration load (defaults when no file is given)
//! 2. Dataset read
//! 3. Store open and load
//! 4. Checks
//! 5. One JSON response on stdout

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::observability::Logger;
use crate::query::{CheckReport, QueryEngine};
use crate::schema::catalog;
use crate::store::{BulkInsertReport, Dataset, LoadReport, Store, StoreOptions};

use super::args::{CheckArg, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_rows, write_response};

/// Paths and selection for one `check` invocation
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub students: PathBuf,
    pub courses: PathBuf,
    pub requests: PathBuf,
    pub check: CheckArg,
    pub config: Option<PathBuf>,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check {
            students,
            courses,
            requests,
            check,
            config,
        } => {
            let request = CheckRequest {
                students,
                courses,
                requests,
                check,
                config,
            };
            let data = check_command(&request)?;
            write_response(data)
        }
        Command::Schema => write_response(schema()?),
    }
}

/// Load the datasets, run the selected checks, and build the response data.
pub fn check_command(request: &CheckRequest) -> CliResult<Value> {
    let config = load_config(request.config.as_deref())?;
    Logger::set_level(config.log_level());

    let dataset = Dataset {
        students: read_rows(&request.students)?,
        courses: read_rows(&request.courses)?,
        requests: read_rows(&request.requests)?,
    };

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime_failed(format!("Failed to create tokio runtime: {}", e)))?;

    runtime.block_on(execute(dataset, config, request.check))
}

/// The declared collection schemas
pub fn schema() -> CliResult<Value> {
    Ok(json!({ "collections": serde_json::to_value(catalog())? }))
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

async fn execute(dataset: Dataset, config: EngineConfig, selection: CheckArg) -> CliResult<Value> {
    let store = Store::open(StoreOptions::from_config(&config))?;
    let load = store.load(dataset).await?;

    let engine = QueryEngine::new(store, Arc::new(config));
    let report = match selection.kind() {
        Some(kind) => CheckReport::from_outcomes([engine.run(kind).collect().await]),
        None => engine.run_all().await,
    };

    Ok(json!({
        "load": load_json(&load),
        "checks": serde_json::to_value(&report)?,
        "total_conflicts": report.total_conflicts(),
    }))
}

fn load_json(load: &LoadReport) -> Value {
    let collections: serde_json::Map<String, Value> = load
        .reports()
        .iter()
        .map(|report| (report.collection.name().to_string(), bulk_json(report)))
        .collect();
    Value::Object(collections)
}

fn bulk_json(report: &BulkInsertReport) -> Value {
    let rejected: Vec<Value> = report
        .rejected
        .iter()
        .map(|rejection| {
            json!({
                "row": rejection.row,
                "code": rejection.error.code(),
                "message": rejection.error.to_string(),
            })
        })
        .collect();

    json!({
        "submitted": report.submitted,
        "inserted": report.inserted,
        "rejected": rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn request(dir: &TempDir, check: CheckArg) -> CheckRequest {
        CheckRequest {
            students: write(
                dir,
                "students.json",
                r#"[{"student_id":"S1","grade_level":"10"},{"student_id":"S1","grade_level":"11"}]"#,
            ),
            courses: write(
                dir,
                "courses.json",
                r#"[{"course_code":"C1","subject_area":"HISTORY","credits_offered":"4","is_ap":"FALSE"},
                    {"course_code":"C2","subject_area":"MATH","credits_offered":"4","is_ap":"FALSE"}]"#,
            ),
            requests: write(
                dir,
                "requests.json",
                r#"[{"student_id":"S1","course_code":"C1"},{"student_id":"S1","course_code":"C2"}]"#,
            ),
            check,
            config: None,
        }
    }

    #[test]
    fn test_check_all_reports_every_check() {
        let dir = TempDir::new().unwrap();
        let data = check_command(&request(&dir, CheckArg::All)).unwrap();

        assert_eq!(data["load"]["students"]["inserted"], 1);
        assert_eq!(data["load"]["students"]["rejected"][0]["code"], "ENROLL_DUPLICATE_KEY");
        assert_eq!(data["checks"]["credits"]["conflicts"][0]["totalCredits"], 8);
        assert_eq!(data["checks"]["grades"]["summary"]["conflicts"], 0);
        assert_eq!(
            data["checks"]["subjects"]["conflicts"][0]["missingSubjects"],
            json!(["ENGLISH", "SCIENCE"])
        );
        assert_eq!(data["checks"]["ap"]["summary"]["conflicts"], 0);
    }

    #[test]
    fn test_single_check() {
        let dir = TempDir::new().unwrap();
        let data = check_command(&request(&dir, CheckArg::Advisory)).unwrap();

        let checks = data["checks"].as_object().unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(data["total_conflicts"], 1);
    }

    #[test]
    fn test_missing_dataset_file() {
        let dir = TempDir::new().unwrap();
        let mut req = request(&dir, CheckArg::Grades);
        req.courses = dir.path().join("absent.json");

        let err = check_command(&req).unwrap_err();
        assert_eq!(err.code_str(), "ENROLL_CLI_IO_ERROR");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = TempDir::new().unwrap();
        let mut req = request(&dir, CheckArg::Grades);
        req.config = Some(write(&dir, "config.json", r#"{"max_in_flight_joins":0}"#));

        let err = check_command(&req).unwrap_err();
        assert_eq!(err.code_str(), "ENROLL_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_schema_lists_three_collections() {
        let data = schema().unwrap();
        assert_eq!(data["collections"].as_array().unwrap().len(), 3);
        assert_eq!(data["collections"][2]["key"]["kind"], "sequence");
    }
}
