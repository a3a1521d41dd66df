//! Result serialization.
//!
//! Writes a script's result set to `<script dir>/<stem>.csv` or
//! `<stem>.txt`. Artifacts are written to a temporary file first and then
//! persisted over the target, so a previous artifact is replaced whole.

use crate::config::OutputFormat;
use crate::db::{QueryResult, Value};
use crate::discovery::ScriptFile;
use crate::error::{Result, SqlRunError};
use comfy_table::presets::ASCII_FULL;
use comfy_table::{ContentArrangement, Table};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Returns the artifact path for a script in the given format.
pub fn artifact_path(script: &ScriptFile, format: OutputFormat) -> PathBuf {
    script
        .directory()
        .join(format!("{}.{}", script.stem, format.extension()))
}

/// Writes the artifact for one script and returns its path.
pub fn write_artifact(
    script: &ScriptFile,
    result: &QueryResult,
    format: OutputFormat,
) -> Result<PathBuf> {
    let path = artifact_path(script, format);
    let content = match format {
        OutputFormat::Csv => render_csv(result).map_err(|e| SqlRunError::output_write(&path, e))?,
        OutputFormat::Table => render_table(result).into_bytes(),
    };

    atomic_write(&path, &content)?;
    Ok(path)
}

fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_display_string(),
    }
}

/// Renders a result as RFC 4180 delimited text with a header row.
pub fn render_csv(result: &QueryResult) -> std::result::Result<Vec<u8>, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if !result.columns.is_empty() {
        writer
            .write_record(result.column_names())
            .map_err(|e| e.to_string())?;
    }
    for row in &result.rows {
        writer
            .write_record(row.iter().map(csv_field))
            .map_err(|e| e.to_string())?;
    }

    writer.into_inner().map_err(|e| e.to_string())
}

/// Renders a result as a fixed-width text table followed by a row count.
pub fn render_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "(empty result)\n".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(result.column_names());

    for row in &result.rows {
        table.add_row(row.iter().map(Value::to_display_string));
    }

    let count = result.row_count();
    format!(
        "{table}\n{count} row{}\n",
        if count == 1 { "" } else { "s" }
    )
}

/// Writes content to a file through a temporary file in the same directory.
///
/// The target is either fully written or left as it was.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let fail = |e: std::io::Error| SqlRunError::output_write(path, e.to_string());

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(fail)?;
    temp_file.write_all(content).map_err(fail)?;
    temp_file.flush().map_err(fail)?;
    temp_file.persist(path).map_err(|e| fail(e.error))?;

    Ok(())
}
