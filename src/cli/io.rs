//! JSON I/O handling for CLI
//!
//! - Input: one JSON file per dataset, an array of row objects
//! - Output: single JSON object via stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::model::Row;

/// Read a dataset file: a JSON array of objects.
///
/// String values are taken as is. Numbers and booleans keep their JSON
/// text; `null` fields are dropped, as an empty CSV cell would be.
pub fn read_rows(path: &Path) -> CliResult<Vec<Row>> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_rows(&content)
        .map_err(|e| CliError::invalid_input(format!("{}: {}", path.display(), e.message())))
}

/// Parse rows from JSON text
pub fn parse_rows(content: &str) -> CliResult<Vec<Row>> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        return Err(CliError::invalid_input("expected a JSON array of rows"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .filter_map(|(name, value)| cell_text(value).map(|text| (name, text)))
                .collect()),
            _ => Err(CliError::invalid_input(format!(
                "row {} is not an object",
                position
            ))),
        })
        .collect()
}

fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
